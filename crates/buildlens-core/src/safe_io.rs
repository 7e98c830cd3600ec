//! Atomic file writes for configuration persistence.
//!
//! Writing to a temp file and renaming leaves the target either fully
//! updated or unchanged, so a crash mid-save can't corrupt the persisted
//! configuration.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Atomically write UTF-8 text to a file.
pub fn atomic_write_text(path: &Path, contents: &str) -> io::Result<()> {
    atomic_write(path, contents.as_bytes())
}

/// Atomically write bytes: temp file with fsync, then rename onto the
/// target. Parent directories are created as needed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        atomic_write_text(&path, "timeout_seconds = 120\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "timeout_seconds = 120\n"
        );
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        atomic_write_text(&path, "x = 1\n").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn overwrites_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        atomic_write_text(&path, "old").unwrap();
        atomic_write_text(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!path.with_extension("tmp").exists());
    }
}
