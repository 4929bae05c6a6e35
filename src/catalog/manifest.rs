//! Manifest parsing.
//!
//! A manifest is a text file listing frame files in playback order, one per
//! line, each optionally followed by a decimal byte-length hint:
//!
//! ```text
//! intro-001.jpg 4312
//! intro-002.jpg
//! ```
//!
//! Names are resolved against the configured base directory. Lines that are
//! blank, too long, or that resolve to no bytes are logged and skipped.
//! Reading the manifest has no side effects, so the count pass and the load
//! pass see the same entries.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{PlaybackError, Result};
use crate::playback::Clock;
use crate::schema::PlayerConfig;

/// File extensions recognised as frame files when generating a manifest.
pub const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "rgb565"];

/// A manifest line that resolved to a readable length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// File name as written in the manifest.
    pub name: String,
    /// Name resolved against the base directory.
    pub path: PathBuf,
    /// Number of bytes to load.
    pub len: usize,
}

/// Result of a full pass over a manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestScan {
    pub entries: Vec<ManifestEntry>,
    /// Sum of all entry lengths.
    pub total_bytes: usize,
    /// Lines that were skipped.
    pub skipped: usize,
}

impl ManifestScan {
    pub fn frame_count(&self) -> usize {
        self.entries.len()
    }
}

/// Split a manifest line into a file name and optional length hint.
///
/// Returns `None` for lines with no file name. An unparseable hint is
/// treated as absent.
pub fn parse_line(line: &str) -> Option<(&str, Option<u64>)> {
    let line = line.trim_end_matches(['\r', '\n']).trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((name, rest)) => Some((name, rest.trim().parse::<u64>().ok())),
        None => Some((line, None)),
    }
}

/// Streaming reader yielding resolved manifest entries.
pub struct ManifestReader<'a> {
    reader: BufReader<File>,
    config: &'a PlayerConfig,
    clock: &'a dyn Clock,
    line_buf: Vec<u8>,
    lines_read: usize,
    skipped: usize,
}

impl<'a> ManifestReader<'a> {
    /// Open a manifest for reading.
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: &'a PlayerConfig,
        clock: &'a dyn Clock,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PlaybackError::not_found(path, e))?;
        Ok(Self {
            reader: BufReader::new(file),
            config,
            clock,
            line_buf: Vec::with_capacity(config.max_path_len),
            lines_read: 0,
            skipped: 0,
        })
    }

    /// Lines consumed so far, including skipped ones.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_line(&mut self) -> Option<String> {
        self.line_buf.clear();
        match self.reader.read_until(b'\n', &mut self.line_buf) {
            Ok(0) => None,
            Ok(_) => {
                self.lines_read += 1;
                if self.lines_read % self.config.yield_every == 0 {
                    self.clock.yield_now();
                }
                Some(String::from_utf8_lossy(&self.line_buf).into_owned())
            }
            Err(e) => {
                log::warn!(
                    "manifest read error after line {}: {}",
                    self.lines_read,
                    e
                );
                None
            }
        }
    }

    fn resolve(&self, name: &str, hint: Option<u64>) -> std::result::Result<ManifestEntry, String> {
        if name.len() > self.config.max_filename_len {
            return Err(format!(
                "file name longer than {} bytes",
                self.config.max_filename_len
            ));
        }

        let path = self.config.base_dir.join(name);
        if path.as_os_str().len() > self.config.max_path_len {
            return Err(format!("path longer than {} bytes", self.config.max_path_len));
        }

        let len = match hint {
            Some(hint) if hint > 0 => hint,
            _ => fs::metadata(&path)
                .map_err(|e| format!("stat {} failed: {}", path.display(), e))?
                .len(),
        };
        if len == 0 {
            return Err("zero-length frame".to_string());
        }
        let len = usize::try_from(len).map_err(|_| format!("length {} too large", len))?;

        Ok(ManifestEntry {
            name: name.to_string(),
            path,
            len,
        })
    }
}

impl Iterator for ManifestReader<'_> {
    type Item = ManifestEntry;

    fn next(&mut self) -> Option<ManifestEntry> {
        loop {
            let line = self.next_line()?;
            let Some((name, hint)) = parse_line(&line) else {
                log::debug!("manifest line {}: blank, skipped", self.lines_read);
                self.skipped += 1;
                continue;
            };
            match self.resolve(name, hint) {
                Ok(entry) => return Some(entry),
                Err(reason) => {
                    log::warn!(
                        "manifest line {} ({}): {}, skipped",
                        self.lines_read,
                        name,
                        reason
                    );
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Read a whole manifest and total its resolved lengths.
///
/// Fails with `NotFound` if the manifest cannot be opened, with
/// `NoValidFrames` if no line resolves, and with `OutOfMemory` if the
/// lengths add up to more than the address space.
pub fn scan<P: AsRef<Path>>(
    path: P,
    config: &PlayerConfig,
    clock: &dyn Clock,
) -> Result<ManifestScan> {
    let path = path.as_ref();
    let mut reader = ManifestReader::open(path, config, clock)?;
    let mut scan = ManifestScan::default();

    for entry in reader.by_ref() {
        scan.total_bytes = scan.total_bytes.checked_add(entry.len).ok_or_else(|| {
            log::warn!(
                "manifest {}: total size overflows at {}",
                path.display(),
                entry.name
            );
            PlaybackError::out_of_memory("slow", usize::MAX)
        })?;
        scan.entries.push(entry);
    }
    scan.skipped = reader.skipped();

    if scan.entries.is_empty() {
        return Err(PlaybackError::NoValidFrames(path.to_path_buf()));
    }

    log::info!(
        "manifest {}: {} frames, {} bytes, {} lines skipped",
        path.display(),
        scan.entries.len(),
        scan.total_bytes,
        scan.skipped
    );
    Ok(scan)
}

/// Write a manifest listing every frame file in `dir`, sorted by name, with
/// explicit length hints.
///
/// Returns the number of entries written.
pub fn write_manifest<P: AsRef<Path>, Q: AsRef<Path>>(dir: P, output: Q) -> io::Result<usize> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_frame = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_frame {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let len = entry.metadata()?.len();
        if len > 0 {
            frames.push((name.to_string(), len));
        }
    }
    frames.sort();

    let mut writer = BufWriter::new(File::create(output)?);
    for (name, len) in &frames {
        writeln!(writer, "{} {}", name, len)?;
    }
    writer.flush()?;

    Ok(frames.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::ManualClock;
    use tempfile::tempdir;

    fn config_for(dir: &Path) -> PlayerConfig {
        PlayerConfig {
            base_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("a.jpg 100\n"), Some(("a.jpg", Some(100))));
        assert_eq!(parse_line("b.jpg\r\n"), Some(("b.jpg", None)));
        assert_eq!(parse_line("c.jpg   42  "), Some(("c.jpg", Some(42))));
        assert_eq!(parse_line("d.jpg abc"), Some(("d.jpg", None)));
        assert_eq!(parse_line("\r\n"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_hint_and_stat_resolution() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), vec![0u8; 50]).unwrap();
        let manifest = dir.path().join("manifest.txt");
        fs::write(&manifest, "a.jpg 100\n\nb.jpg\n").unwrap();

        let config = config_for(dir.path());
        let clock = ManualClock::new();
        let scan = scan(&manifest, &config, &clock).unwrap();

        let names: Vec<_> = scan
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.len))
            .collect();
        assert_eq!(names, vec![("a.jpg", 100), ("b.jpg", 50)]);
        assert_eq!(scan.total_bytes, 150);
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn test_bad_lines_are_skipped_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("empty.jpg"), b"").unwrap();
        let manifest = dir.path().join("manifest.txt");
        let long_name = format!("{}.jpg", "x".repeat(100));
        fs::write(
            &manifest,
            format!("one.jpg 10\nmissing.jpg\n{} 5\nempty.jpg\n   \ntwo.jpg 0020\n", long_name),
        )
        .unwrap();

        let config = config_for(dir.path());
        let clock = ManualClock::new();
        let scan = scan(&manifest, &config, &clock).unwrap();

        assert_eq!(scan.frame_count(), 2);
        assert_eq!(scan.entries[0].name, "one.jpg");
        assert_eq!(scan.entries[1].name, "two.jpg");
        assert_eq!(scan.entries[1].len, 20);
        assert_eq!(scan.skipped, 4);
    }

    #[test]
    fn test_long_resolved_path_is_skipped() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("manifest.txt");
        fs::write(&manifest, "ok.jpg 4\nmuch-longer-name.jpg 4\n").unwrap();

        // Room for "/ok.jpg" after the base directory, not for the long name.
        let config = PlayerConfig {
            max_path_len: dir.path().as_os_str().len() + 8,
            ..config_for(dir.path())
        };
        assert!("much-longer-name.jpg".len() <= config.max_filename_len);
        let clock = ManualClock::new();
        let scan = scan(&manifest, &config, &clock).unwrap();

        assert_eq!(scan.frame_count(), 1);
        assert_eq!(scan.entries[0].name, "ok.jpg");
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn test_oversized_hints_are_out_of_memory() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("manifest.txt");
        fs::write(&manifest, format!("a.jpg {}\nb.jpg 1\n", usize::MAX)).unwrap();

        let config = config_for(dir.path());
        let clock = ManualClock::new();
        let err = scan(&manifest, &config, &clock).unwrap_err();
        assert!(matches!(err, PlaybackError::OutOfMemory { .. }));
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let clock = ManualClock::new();
        let err = scan(dir.path().join("nope.txt"), &config, &clock).unwrap_err();
        assert!(matches!(err, PlaybackError::NotFound { .. }));
    }

    #[test]
    fn test_no_valid_frames() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("manifest.txt");
        fs::write(&manifest, "\n\nghost.jpg\n").unwrap();
        let config = config_for(dir.path());
        let clock = ManualClock::new();
        let err = scan(&manifest, &config, &clock).unwrap_err();
        assert!(matches!(err, PlaybackError::NoValidFrames(_)));
    }

    #[test]
    fn test_scan_is_repeatable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.jpg"), vec![1u8; 7]).unwrap();
        let manifest = dir.path().join("manifest.txt");
        fs::write(&manifest, "x.jpg\nx.jpg 3\n").unwrap();
        let config = config_for(dir.path());
        let clock = ManualClock::new();

        let first = scan(&manifest, &config, &clock).unwrap();
        let second = scan(&manifest, &config, &clock).unwrap();
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.total_bytes, 10);
    }

    #[test]
    fn test_reader_yields_cooperatively() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("manifest.txt");
        let body: String = (0..25).map(|i| format!("f{}.jpg 1\n", i)).collect();
        fs::write(&manifest, body).unwrap();
        let config = PlayerConfig {
            yield_every: 10,
            ..config_for(dir.path())
        };
        let clock = ManualClock::new();
        let count = ManifestReader::open(&manifest, &config, &clock)
            .unwrap()
            .count();
        assert_eq!(count, 25);
        assert_eq!(clock.yields(), 2);
    }

    #[test]
    fn test_write_manifest_lists_frames_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b-002.jpg"), vec![0u8; 30]).unwrap();
        fs::write(dir.path().join("a-001.JPG"), vec![0u8; 20]).unwrap();
        fs::write(dir.path().join("raw.rgb565"), vec![0u8; 8]).unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        let out = dir.path().join("manifest.txt");

        let written = write_manifest(dir.path(), &out).unwrap();
        assert_eq!(written, 3);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "a-001.JPG 20\nb-002.jpg 30\nraw.rgb565 8\n"
        );

        let config = config_for(dir.path());
        let clock = ManualClock::new();
        let scan = scan(&out, &config, &clock).unwrap();
        assert_eq!(scan.total_bytes, 58);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn valid_lines_survive_in_order(layout in prop::collection::vec(any::<bool>(), 1..40)) {
                let dir = tempdir().unwrap();
                let manifest = dir.path().join("manifest.txt");
                let mut body = String::new();
                let mut expected = Vec::new();
                for (i, valid) in layout.iter().enumerate() {
                    if *valid {
                        let name = format!("frame{:03}.jpg", i);
                        body.push_str(&format!("{} {}\n", name, i + 1));
                        expected.push(name);
                    } else if i % 2 == 0 {
                        body.push('\n');
                    } else {
                        body.push_str(&format!("absent{}.jpg\n", i));
                    }
                }
                fs::write(&manifest, body).unwrap();

                let config = config_for(dir.path());
                let clock = ManualClock::new();
                let names: Vec<String> = ManifestReader::open(&manifest, &config, &clock)
                    .unwrap()
                    .map(|e| e.name)
                    .collect();
                prop_assert_eq!(names, expected);
            }
        }
    }
}
