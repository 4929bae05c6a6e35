//! Frame loader: fills the arena from the frames a manifest lists.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::arena::FrameArena;
use super::manifest::{self, ManifestReader};
use super::pool::MemoryPools;
use crate::error::{PlaybackError, Result};
use crate::playback::Clock;
use crate::schema::PlayerConfig;

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Frames written to the arena.
    pub frames: usize,
    /// Backing-store bytes written.
    pub bytes: usize,
    /// Manifest lines skipped by the parser.
    pub skipped_lines: usize,
    /// Entries that resolved but could not be read.
    pub failed_frames: usize,
}

/// Scan the manifest, allocate the arena, and stream every frame into it.
///
/// The manifest is read twice: once to size the arena, once to load. Frames
/// that fail to read are skipped without leaving a gap.
pub fn load_frames<P: AsRef<Path>>(
    manifest_path: P,
    config: &PlayerConfig,
    pools: &MemoryPools,
    clock: &dyn Clock,
) -> Result<(FrameArena, LoadSummary)> {
    let manifest_path = manifest_path.as_ref();

    let scan = manifest::scan(manifest_path, config, clock)?;
    let mut arena = FrameArena::allocate(scan.frame_count(), scan.total_bytes, config, pools)?;

    let mut reader = ManifestReader::open(manifest_path, config, clock)?;
    let mut failed_frames = 0;
    let mut attempted = 0;

    for entry in reader.by_ref() {
        attempted += 1;
        if attempted % config.yield_every == 0 {
            clock.yield_now();
        }

        let loaded = File::open(&entry.path).and_then(|file| {
            let mut file = BufReader::new(file);
            arena.push_frame(&entry.name, &mut file, entry.len)
        });
        match loaded {
            Ok(()) => log::trace!("loaded {} ({} bytes)", entry.name, entry.len),
            Err(e) => {
                log::warn!("frame {} skipped: {}", entry.name, e);
                failed_frames += 1;
            }
        }
    }

    if arena.frame_count() == 0 {
        return Err(PlaybackError::NoValidFrames(manifest_path.to_path_buf()));
    }

    let summary = LoadSummary {
        frames: arena.frame_count(),
        bytes: arena.bytes_used(),
        skipped_lines: reader.skipped(),
        failed_frames,
    };
    log::info!(
        "loaded {} frames ({} bytes), {} lines skipped, {} frames unreadable",
        summary.frames,
        summary.bytes,
        summary.skipped_lines,
        summary.failed_frames
    );
    Ok((arena, summary))
}
