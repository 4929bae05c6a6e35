//! Input module - Rotary encoder decoding.

mod quadrature;

pub use quadrature::{PulseCounter, QuadratureDecoder, SimulatedCounter};
