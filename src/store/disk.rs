use crate::core::error::{RateError, RateResult};
use crate::core::storage::SubscriberLog;
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

const PARTITION: &str = "subscribers";

/// Subscriber log stored in a `fjall` partition.
///
/// Keys are big-endian sequence numbers so iteration order is append order.
pub struct FjallLog {
    keyspace: Keyspace,
    partition: PartitionHandle,
    next_seq: AtomicU64,
}

impl FjallLog {
    pub fn open(path: &Path) -> RateResult<Self> {
        let keyspace = Config::new(path)
            .open()
            .map_err(|e| RateError::storage("Failed to open keyspace", e))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .map_err(|e| RateError::storage("Failed to open partition", e))?;

        let next_seq = match partition
            .last_key_value()
            .map_err(|e| RateError::storage("Failed to read last record", e))?
        {
            Some((key, _)) => decode_seq(&key)? + 1,
            None => 0,
        };
        debug!(path = %path.display(), next_seq, "Opened fjall subscriber log");

        Ok(Self {
            keyspace,
            partition,
            next_seq: AtomicU64::new(next_seq),
        })
    }
}

fn decode_seq(key: &[u8]) -> RateResult<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| RateError::storage("Corrupt record key", format!("{} bytes", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl SubscriberLog for FjallLog {
    async fn load(&self) -> RateResult<Vec<String>> {
        self.partition
            .iter()
            .map(|kv| {
                let (_, value) = kv.map_err(|e| RateError::storage("Failed to scan log", e))?;
                String::from_utf8(value.to_vec())
                    .map_err(|e| RateError::storage("Record is not valid UTF-8", e))
            })
            .collect()
    }

    async fn append(&self, record: &str) -> RateResult<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.partition
            .insert(seq.to_be_bytes().to_vec(), record.as_bytes())
            .map_err(|e| RateError::storage("Failed to append subscriber", e))?;
        if let Err(e) = self.keyspace.persist(PersistMode::SyncAll) {
            self.discard(seq);
            return Err(RateError::storage("Failed to persist subscriber log", e));
        }
        debug!(seq, "Appended subscriber record");
        Ok(())
    }
}

impl FjallLog {
    /// Removes a record whose append was not acknowledged.
    fn discard(&self, seq: u64) {
        if let Err(e) = self.partition.remove(seq.to_be_bytes().to_vec()) {
            warn!(seq, error = %e, "Failed to discard unacknowledged subscriber record");
        }
    }
}
