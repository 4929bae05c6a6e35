//! Loaded frames plus the shared target interval.

use std::path::Path;

use crate::catalog::{FrameArena, LoadSummary, MemoryPools, load_frames};
use crate::error::Result;
use crate::playback::Clock;
use crate::schema::PlayerConfig;

/// State of one playback session.
///
/// Frames are loaded at most once. The target interval is written by the
/// pacing loop whenever the encoder reports a step.
#[derive(Debug)]
pub struct PlaybackSession {
    arena: Option<FrameArena>,
    summary: Option<LoadSummary>,
    target_interval_ms: u32,
}

impl PlaybackSession {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            arena: None,
            summary: None,
            target_interval_ms: config.initial_interval_ms,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.arena.is_some()
    }

    /// Load every frame the manifest lists.
    ///
    /// Does nothing on a session that is already loaded. A failed load leaves
    /// the session unloaded, so the caller may retry.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        manifest_path: P,
        config: &PlayerConfig,
        pools: &MemoryPools,
        clock: &dyn Clock,
    ) -> Result<LoadSummary> {
        if let (Some(_), Some(summary)) = (&self.arena, self.summary) {
            log::debug!("session already loaded, skipping");
            return Ok(summary);
        }
        let (arena, summary) = load_frames(manifest_path, config, pools, clock)?;
        self.arena = Some(arena);
        self.summary = Some(summary);
        Ok(summary)
    }

    pub fn summary(&self) -> Option<LoadSummary> {
        self.summary
    }

    pub fn arena(&self) -> Option<&FrameArena> {
        self.arena.as_ref()
    }

    pub fn arena_mut(&mut self) -> Option<&mut FrameArena> {
        self.arena.as_mut()
    }

    pub fn frame_count(&self) -> usize {
        self.arena.as_ref().map_or(0, FrameArena::frame_count)
    }

    pub fn target_interval_ms(&self) -> u32 {
        self.target_interval_ms
    }

    pub fn set_target_interval_ms(&mut self, interval_ms: u32) {
        self.target_interval_ms = interval_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use crate::playback::ManualClock;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_reload_is_noop() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rgb565"), vec![0u8; 64]).unwrap();
        let manifest = dir.path().join("manifest.txt");
        fs::write(&manifest, "a.rgb565\n").unwrap();

        let config = PlayerConfig {
            base_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let pools = MemoryPools::from_config(&config);
        let clock = ManualClock::new();
        let mut session = PlaybackSession::new(&config);
        assert!(!session.is_loaded());

        let first = session.load(&manifest, &config, &pools, &clock).unwrap();
        let used = pools.slow.used();
        assert!(session.is_loaded());

        // Even a vanished manifest does not matter once loaded.
        fs::remove_file(&manifest).unwrap();
        let second = session.load(&manifest, &config, &pools, &clock).unwrap();
        assert_eq!(first, second);
        assert_eq!(pools.slow.used(), used);
        assert_eq!(session.frame_count(), 1);
    }

    #[test]
    fn test_failed_load_can_retry() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("manifest.txt");
        let config = PlayerConfig {
            base_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let pools = MemoryPools::from_config(&config);
        let clock = ManualClock::new();
        let mut session = PlaybackSession::new(&config);

        let err = session.load(&manifest, &config, &pools, &clock).unwrap_err();
        assert!(matches!(err, PlaybackError::NotFound { .. }));
        assert!(!session.is_loaded());

        fs::write(dir.path().join("a.rgb565"), vec![0u8; 8]).unwrap();
        fs::write(&manifest, "a.rgb565\n").unwrap();
        assert_eq!(session.load(&manifest, &config, &pools, &clock).unwrap().frames, 1);
        assert_eq!(session.target_interval_ms(), config.initial_interval_ms);
    }
}
