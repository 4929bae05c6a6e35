//! Debounced step events from a quadrature pulse counter.
//!
//! The counter itself is updated asynchronously (by a peripheral, or by
//! another thread for [`SimulatedCounter`]). Only the raw read is shared;
//! the debounce and drift-reset state below lives in the decoder and is
//! touched from the pacing loop alone.

use std::sync::Arc;
use std::sync::atomic::{AtomicI16, Ordering};

use log::{debug, trace};

use crate::schema::{EncoderMode, PlayerConfig};

/// A signed 16-bit hardware pulse counter.
pub trait PulseCounter {
    /// Current raw count, read atomically at register width.
    fn read(&self) -> i16;

    /// Reset the count to zero.
    fn clear(&mut self);
}

/// Software pulse counter shared between a producer and the decoder.
///
/// Wraps at 16 bits like a hardware register.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCounter {
    count: Arc<AtomicI16>,
}

impl SimulatedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `counts` raw pulses (negative for counter-clockwise).
    pub fn pulse(&self, counts: i16) {
        self.count.fetch_add(counts, Ordering::SeqCst);
    }
}

impl PulseCounter for SimulatedCounter {
    fn read(&self) -> i16 {
        self.count.load(Ordering::SeqCst)
    }

    fn clear(&mut self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

/// Turns raw pulse counts into debounced signed steps.
#[derive(Debug)]
pub struct QuadratureDecoder<C> {
    counter: C,
    last_raw: i16,
    last_event_ms: Option<u64>,
    debounce_ms: u64,
    drift_threshold: i32,
    mode: EncoderMode,
    counts_per_detent: i32,
}

impl<C: PulseCounter> QuadratureDecoder<C> {
    pub fn new(counter: C, config: &PlayerConfig) -> Self {
        Self {
            counter,
            last_raw: 0,
            last_event_ms: None,
            debounce_ms: config.debounce_ms as u64,
            drift_threshold: i32::from(config.drift_threshold),
            mode: config.encoder_mode,
            counts_per_detent: i32::from(config.counts_per_detent.max(1)),
        }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn mode(&self) -> EncoderMode {
        self.mode
    }

    /// Raw counts seen but not yet reported.
    pub fn pending(&self) -> i32 {
        i32::from(self.counter.read().wrapping_sub(self.last_raw))
    }

    fn window_open(&self, now_ms: u64) -> bool {
        match self.last_event_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.debounce_ms,
        }
    }

    /// Signed steps since the last reported event, or 0.
    ///
    /// Motion inside the debounce window is deferred, not dropped: the next
    /// call after the window reopens reports the accumulated difference.
    pub fn get_delta(&mut self, now_ms: u64) -> i32 {
        let raw = self.counter.read();
        let pending = i32::from(raw.wrapping_sub(self.last_raw));

        let mut delta = 0;
        if pending != 0 {
            if self.window_open(now_ms) {
                let (steps, consumed) = match self.mode {
                    EncoderMode::Continuous => (pending, pending),
                    EncoderMode::Detent => {
                        let steps = pending / self.counts_per_detent;
                        (steps, steps * self.counts_per_detent)
                    }
                };
                if steps != 0 {
                    self.last_raw = self.last_raw.wrapping_add(consumed as i16);
                    self.last_event_ms = Some(now_ms);
                    delta = steps;
                    debug!("Encoder delta {} (raw {})", steps, raw);
                }
            } else {
                trace!("Encoder motion {} deferred by debounce", pending);
            }
        }

        if i32::from(raw).abs() > self.drift_threshold {
            // Rebase so unreported motion survives the clear.
            let unreported = raw.wrapping_sub(self.last_raw);
            self.counter.clear();
            self.last_raw = 0i16.wrapping_sub(unreported);
            debug!("Encoder counter reset at raw {}", raw);
        }

        delta
    }
}
