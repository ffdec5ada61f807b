use crate::core::error::{RateError, RateResult};
use crate::core::storage::SubscriberLog;
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Newline-delimited subscriber log in a plain text file.
///
/// A record is complete once its terminating newline is on disk. A trailing
/// fragment without one is the remains of an interrupted append; it is cut
/// off on load and before every append. A failed append truncates the file
/// back to its previous length. If even that fails the log stops accepting
/// appends until the process restarts.
pub struct FileLog {
    path: PathBuf,
    append_lock: Mutex<()>,
    poisoned: AtomicBool,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
            poisoned: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn truncate_to(&self, len: u64) -> RateResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| RateError::storage("Failed to open log for repair", e))?;
        file.set_len(len)
            .await
            .map_err(|e| RateError::storage("Failed to truncate subscriber log", e))?;
        file.sync_all()
            .await
            .map_err(|e| RateError::storage("Failed to sync repaired log", e))
    }

    async fn read_all(&self) -> RateResult<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RateError::storage(
                &format!("Failed to read {}", self.path.display()),
                e,
            )),
        }
    }

    /// Cuts a torn record off `bytes` on disk and returns the length kept.
    async fn drop_torn_tail(&self, bytes: &[u8]) -> RateResult<u64> {
        let complete = complete_len(bytes);
        if complete < bytes.len() {
            warn!(
                path = %self.path.display(),
                dropped_bytes = bytes.len() - complete,
                "Discarding torn record at end of subscriber log"
            );
            self.truncate_to(complete as u64).await?;
        }
        Ok(complete as u64)
    }

    /// Length of the log up to its last complete record.
    async fn committed_len(&self) -> RateResult<u64> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(RateError::storage("Failed to open subscriber log", e)),
        };
        let len = file
            .metadata()
            .await
            .map_err(|e| RateError::storage("Failed to stat subscriber log", e))?
            .len();
        if len == 0 {
            return Ok(0);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .await
            .map_err(|e| RateError::storage("Failed to seek subscriber log", e))?;
        file.read_exact(&mut last)
            .await
            .map_err(|e| RateError::storage("Failed to read subscriber log", e))?;
        if last[0] == b'\n' {
            return Ok(len);
        }

        let bytes = self.read_all().await?.unwrap_or_default();
        self.drop_torn_tail(&bytes).await
    }

    /// Settles an append attempt that started at `prev_len`.
    ///
    /// On failure the file is truncated back so neither a fragment nor an
    /// unacknowledged complete record stays behind.
    async fn finish_append(&self, prev_len: u64, written: RateResult<()>) -> RateResult<()> {
        let Err(e) = written else {
            return Ok(());
        };
        if let Err(rollback) = self.truncate_to(prev_len).await {
            error!(
                path = %self.path.display(),
                error = %rollback,
                "Failed to roll back subscriber log, refusing further appends"
            );
            self.poisoned.store(true, Ordering::SeqCst);
        }
        Err(e)
    }
}

fn complete_len(bytes: &[u8]) -> usize {
    bytes.iter().rposition(|b| *b == b'\n').map_or(0, |idx| idx + 1)
}

#[async_trait]
impl SubscriberLog for FileLog {
    async fn load(&self) -> RateResult<Vec<String>> {
        let _guard = self.append_lock.lock().await;
        let Some(bytes) = self.read_all().await? else {
            debug!("No subscriber log at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        };
        let complete = self.drop_torn_tail(&bytes).await? as usize;

        let text = std::str::from_utf8(&bytes[..complete])
            .map_err(|e| RateError::storage("Subscriber log is not valid UTF-8", e))?;
        let records: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = records.len(), "Loaded subscriber log");
        Ok(records)
    }

    async fn append(&self, record: &str) -> RateResult<()> {
        if record.contains('\n') {
            return Err(RateError::InvalidEmail(record.to_string()));
        }

        let _guard = self.append_lock.lock().await;
        if self.poisoned.load(Ordering::SeqCst) {
            return Err(RateError::StorageUnavailable(format!(
                "Subscriber log {} could not be rolled back after a failed append",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RateError::storage("Failed to create log directory", e))?;
        }
        let prev_len = self.committed_len().await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RateError::storage("Failed to open subscriber log", e))?;

        // One write per record keeps the newline terminator last on disk.
        let line = format!("{record}\n");
        let written = async {
            file.write_all(line.as_bytes())
                .await
                .map_err(|e| RateError::storage("Failed to append subscriber", e))?;
            file.flush()
                .await
                .map_err(|e| RateError::storage("Failed to flush subscriber log", e))?;
            file.sync_data()
                .await
                .map_err(|e| RateError::storage("Failed to sync subscriber log", e))
        }
        .await;
        drop(file);
        self.finish_append(prev_len, written).await?;

        debug!(path = %self.path.display(), "Appended subscriber record");
        Ok(())
    }
}
