//! Cross-process exclusion for checkpoint read-modify-write.
//!
//! `init` and `set-length` load the checkpoint, change it, and save it back.
//! Two overlapping runs would otherwise both read the old state and the
//! second save would drop the first change. Each run holds an exclusive
//! `flock` on a sibling `<state file>.lock` for the whole sequence. The lock
//! file is never removed; removing it would let a late opener lock a
//! different inode than an earlier holder.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive advisory lock guarding one checkpoint file. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
    path: PathBuf,
}

impl StateLock {
    /// Block until the lock for `state_file` is held.
    ///
    /// # Errors
    ///
    /// Fails if the lock file cannot be opened or locked.
    pub fn acquire(state_file: &Path) -> io::Result<Self> {
        let path = lock_path(state_file);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        flock_exclusive(&file)?;

        debug!(path = %path.display(), "State lock acquired");
        Ok(Self { _file: file, path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        // Closing the file releases the flock.
        debug!(path = %self.path.display(), "State lock released");
    }
}

fn lock_path(state_file: &Path) -> PathBuf {
    let mut name: OsString = state_file.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn flock_exclusive(file: &File) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        loop {
            // SAFETY: flock is a standard POSIX call. fd is a valid file
            // descriptor owned by `file`, which outlives this call.
            #[allow(unsafe_code)]
            let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
            if result == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(())
    }
}
