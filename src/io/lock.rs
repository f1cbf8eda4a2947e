//! Lock file primitives for single-instance enforcement.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;

/// `$XDG_RUNTIME_DIR/solpaper.lock`, or the temp dir when there is no runtime dir.
pub fn get_lock_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(LOCK_FILE_NAME)
}

/// An exclusively locked file. The lock is released and the file removed on drop.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Try to take the lock without blocking. `Ok(None)` means another process
    /// holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(_) => Ok(None),
        }
    }

    /// Replace the file's contents.
    pub fn write(&mut self, contents: &str) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(contents.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.lock");

        let mut lock = LockFile::try_acquire(&path).unwrap().unwrap();
        lock.write("123\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "123\n");

        assert!(LockFile::try_acquire(&path).unwrap().is_none());

        drop(lock);
        assert!(!path.exists());
        assert!(LockFile::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.lock");
        let mut lock = LockFile::try_acquire(&path).unwrap().unwrap();
        lock.write("a much longer first line\n").unwrap();
        lock.write("42\n").unwrap();
        assert_eq!(std::fs::read_to_string(lock.path()).unwrap(), "42\n");
    }

    #[test]
    #[serial]
    fn test_lock_path_uses_runtime_dir() {
        let original = std::env::var("XDG_RUNTIME_DIR").ok();
        unsafe {
            std::env::set_var("XDG_RUNTIME_DIR", "/run/user/1000");
        }
        let path = get_lock_path();
        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_RUNTIME_DIR", val),
                None => std::env::remove_var("XDG_RUNTIME_DIR"),
            }
        }
        assert_eq!(path, PathBuf::from("/run/user/1000/solpaper.lock"));
    }
}
