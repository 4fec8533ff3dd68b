//! Size-based rotating log file.
//!
//! Before a write that would take the file to `max_bytes` or beyond, the
//! file is closed and shifted down the backup chain (`log` → `log.1` →
//! `log.2` … → `log.N`, oldest dropped) and a fresh file is started. With a
//! backup count of zero the file is truncated in place instead.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only writer with size-based rotation.
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backup_count: u32,
    file: File,
    size: u64,
}

impl RotatingFileWriter {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: u32) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            size,
        })
    }

    /// Path of the active file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Path of backup number `index` (1 = newest).
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.size > 0 && self.size + incoming as u64 >= self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backup_count > 0 {
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
        } else {
            self.file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
        }
        debug!("Rotated event log {} ({} bytes)", self.path.display(), self.size);
        self.size = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actuator.log");
        fs::write(&path, "old line\n").unwrap();

        let mut writer = RotatingFileWriter::open(&path, 1_000, 2).unwrap();
        assert_eq!(writer.size(), 9);
        writer.write_all(b"new line\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old line\nnew line\n");
    }

    #[test]
    fn test_rotates_through_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actuator.log");
        let mut writer = RotatingFileWriter::open(&path, 10, 2).unwrap();

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddddddd\n");
        assert_eq!(
            fs::read_to_string(writer.backup_path(1)).unwrap(),
            "cccccccc\n"
        );
        assert_eq!(
            fs::read_to_string(writer.backup_path(2)).unwrap(),
            "bbbbbbbb\n"
        );
        assert!(!writer.backup_path(3).exists());
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actuator.log");
        let mut writer = RotatingFileWriter::open(&path, 10, 0).unwrap();

        writer.write_all(b"first...\n").unwrap();
        writer.write_all(b"second..\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second..\n");
        assert!(!writer.backup_path(1).exists());
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("rig").join("actuator.log");
        let mut writer = RotatingFileWriter::open(&path, 100, 1).unwrap();
        writer.write_all(b"x\n").unwrap();
        assert!(path.exists());
    }
}
