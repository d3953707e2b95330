use super::WorkbookError;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Advisory lock on `<workbook>.lock`. The OS releases it when the guard drops or the
/// holding process dies; the file itself stays in place.
#[derive(Debug)]
pub struct WorkbookLock {
    path: PathBuf,
    file: File,
}

impl WorkbookLock {
    /// `wb`, `wb/` and `./wb` all map to `wb.lock`.
    pub fn lock_path(workbook: &Path) -> PathBuf {
        let normalized = workbook.components().collect::<PathBuf>();
        let mut raw = normalized.into_os_string();
        raw.push(".lock");
        PathBuf::from(raw)
    }

    pub fn acquire(workbook: &Path, timeout: Duration) -> Result<Self, WorkbookError> {
        let path = Self::lock_path(workbook);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| WorkbookError::Io {
                path: path.clone(),
                source,
            })?;
        let started = Instant::now();

        loop {
            match file.try_lock() {
                Ok(()) => break,
                Err(TryLockError::WouldBlock) => {
                    if started.elapsed() >= timeout {
                        return Err(WorkbookError::LockTimeout {
                            path: workbook.to_path_buf(),
                            timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(started.elapsed())));
                }
                Err(TryLockError::Error(source)) => return Err(WorkbookError::Io { path, source }),
            }
        }

        let mut lock = Self { path, file };
        lock.write_holder();
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Holder pid, for inspecting a busy lock by hand.
    fn write_holder(&mut self) {
        let _ = self.file.set_len(0);
        let _ = self.file.seek(SeekFrom::Start(0));
        let _ = writeln!(self.file, "{}", std::process::id());
    }
}

impl Drop for WorkbookLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
