//! One-shot frame arena.
//!
//! All memory playback needs is acquired up front, in a fixed order:
//!
//! 1. the metadata table, sized to the frame count
//! 2. the backing store for compressed bytes (slow pool)
//! 3. the full output canvas (slow pool)
//! 4. the codec work buffer (fast pool, falling back to the slow pool)
//!
//! If any step fails, the buffers already acquired are dropped on the way
//! out and returned to their pools, so callers never see a partial arena.

use std::io::{self, Read};

use super::pool::{MemoryPools, PoolBuffer};
use crate::error::{PlaybackError, Result};
use crate::schema::PlayerConfig;

/// Location of one frame inside the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// File name from the manifest.
    pub name: String,
    /// Byte offset into the backing store.
    pub offset: usize,
    /// Compressed length in bytes.
    pub len: usize,
}

impl FrameDescriptor {
    /// One past the last byte of this frame.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Buffers for one playback session.
#[derive(Debug)]
pub struct FrameArena {
    table: Vec<FrameDescriptor>,
    /// Frames the table was sized for.
    slots: usize,
    backing: PoolBuffer<u8>,
    canvas: PoolBuffer<u16>,
    work: PoolBuffer<u8>,
    write_offset: usize,
}

impl FrameArena {
    /// Acquire every buffer for `frame_count` frames totalling `total_bytes`.
    pub fn allocate(
        frame_count: usize,
        total_bytes: usize,
        config: &PlayerConfig,
        pools: &MemoryPools,
    ) -> Result<Self> {
        if frame_count == 0 || total_bytes == 0 {
            return Err(PlaybackError::InvalidArgument(format!(
                "arena needs frames and bytes, got {} frames / {} bytes",
                frame_count, total_bytes
            )));
        }

        let mut table = Vec::new();
        table.try_reserve_exact(frame_count).map_err(|_| {
            PlaybackError::out_of_memory(
                "heap",
                frame_count.saturating_mul(std::mem::size_of::<FrameDescriptor>()),
            )
        })?;

        let backing = pools.slow.allocate::<u8>(total_bytes)?;
        let canvas = pools.slow.allocate::<u16>(config.canvas_pixels())?;
        let work = match pools.fast.allocate::<u8>(config.work_buffer_size) {
            Ok(work) => work,
            Err(e) => {
                log::warn!("work buffer not available in fast memory ({}), using slow pool", e);
                pools.slow.allocate::<u8>(config.work_buffer_size)?
            }
        };

        log::info!(
            "arena: {} frame slots, {} bytes backing, {} bytes canvas, {} bytes work ({})",
            frame_count,
            backing.size_bytes(),
            canvas.size_bytes(),
            work.size_bytes(),
            work.pool_name()
        );

        Ok(Self {
            table,
            slots: frame_count,
            backing,
            canvas,
            work,
            write_offset: 0,
        })
    }

    /// Read exactly `len` bytes from `reader` into the next free region and
    /// record the frame.
    ///
    /// On failure nothing is recorded and the region is reused by the next
    /// frame, so the backing store never has gaps.
    pub fn push_frame<R: Read>(&mut self, name: &str, reader: &mut R, len: usize) -> io::Result<()> {
        if self.table.len() >= self.slots {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "metadata table is full",
            ));
        }
        let offset = self.write_offset;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.backing.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!(
                        "frame of {} bytes does not fit ({} of {} used)",
                        len,
                        offset,
                        self.backing.len()
                    ),
                )
            })?;

        reader.read_exact(&mut self.backing[offset..end])?;

        self.table.push(FrameDescriptor {
            name: name.to_string(),
            offset,
            len,
        });
        self.write_offset = end;
        Ok(())
    }

    /// Frames in playback order.
    pub fn catalog(&self) -> &[FrameDescriptor] {
        &self.table
    }

    pub fn frame_count(&self) -> usize {
        self.table.len()
    }

    /// Backing-store bytes holding frame data.
    pub fn bytes_used(&self) -> usize {
        self.write_offset
    }

    /// Capacity of the backing store.
    pub fn backing_capacity(&self) -> usize {
        self.backing.len()
    }

    /// Compressed bytes of frame `index`.
    pub fn frame_data(&self, index: usize) -> Option<&[u8]> {
        let desc = self.table.get(index)?;
        Some(&self.backing[desc.offset..desc.end()])
    }

    /// Frame bytes together with the mutable canvas and work buffer.
    pub fn frame_parts(&mut self, index: usize) -> Option<(&[u8], &mut [u16], &mut [u8])> {
        let desc = self.table.get(index)?;
        Some((
            &self.backing[desc.offset..desc.end()],
            &mut self.canvas[..],
            &mut self.work[..],
        ))
    }

    /// The full output canvas.
    pub fn canvas(&self) -> &[u16] {
        &self.canvas
    }

    /// Size of the codec work buffer in bytes.
    pub fn work_size(&self) -> usize {
        self.work.len()
    }
}
