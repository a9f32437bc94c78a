use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use crate::error::StoreError;
use crate::store::Result;

const LOCK_FILE: &str = "LOCK";

/// Exclusive advisory lock on a store directory, held until dropped.
///
/// The `LOCK` file inside the directory records the owning process id.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Locks `dir` without blocking. Fails with `LockError` if another handle holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        Self::acquire_file(&path).map_err(|e| {
            let kind = e.kind();
            let msg = match kind {
                io::ErrorKind::WouldBlock => format!("{} is held by another handle", path.display()),
                _ => format!("{}: {}", path.display(), e),
            };
            StoreError::LockError(io::Error::new(kind, msg))
        })
    }

    fn acquire_file(path: &Path) -> io::Result<Self> {
        // No truncate: the previous owner's pid stays until we hold the lock.
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        flock_exclusive(&file)?;

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.flush()?;

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> io::Result<()> {
    use libc::{flock, LOCK_EX, LOCK_NB};

    if unsafe { flock(file.as_raw_fd(), LOCK_EX | LOCK_NB) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// Single-process use is assumed where flock is unavailable.
#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}
