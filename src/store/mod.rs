pub mod disk;
pub mod file;
pub mod memory;

use crate::core::config::{AppConfig, StorageBackend};
use crate::core::storage::SubscriberLog;
use anyhow::{Context, Result};
use disk::FjallLog;
use file::FileLog;
use std::sync::Arc;
use tracing::debug;

/// Opens the subscriber log selected by `config.storage`.
pub fn open_log(config: &AppConfig) -> Result<Arc<dyn SubscriberLog>> {
    let path = config.storage_path()?;
    debug!(backend = ?config.storage.backend, path = %path.display(), "Opening subscriber log");

    let log: Arc<dyn SubscriberLog> = match config.storage.backend {
        StorageBackend::File => Arc::new(FileLog::new(path)),
        StorageBackend::Fjall => {
            std::fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            Arc::new(
                FjallLog::open(&path)
                    .with_context(|| format!("Failed to open log at {}", path.display()))?,
            )
        }
    };
    Ok(log)
}
