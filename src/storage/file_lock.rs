use std::fs::File;
use crate::core::error::{Error, ErrorKind, Result};

/// Exclusive advisory lock on an open record file, released on drop
pub struct FileLock {
    pub file: File,
}

impl FileLock {
    /// Blocks until the lock is granted; any failure is returned, never retried
    pub fn exclusive(file: &File) -> Result<Self> {
        let file = file.try_clone()?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX};

            let fd = file.as_raw_fd();
            unsafe {
                if flock(fd, LOCK_EX) != 0 {
                    return Err(Error {
                        kind: ErrorKind::Storage,
                        context: format!(
                            "Failed to acquire lock: {}",
                            std::io::Error::last_os_error()
                        ),
                    });
                }
            }
        }

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}
