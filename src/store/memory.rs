use crate::core::error::RateResult;
use crate::core::storage::SubscriberLog;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// In-process subscriber log. Nothing survives the process.
#[derive(Default)]
pub struct MemoryLog {
    records: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the log, as if the records had been appended earlier.
    pub fn with_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: Mutex::new(records.into_iter().map(Into::into).collect()),
        }
    }

    pub async fn records(&self) -> Vec<String> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl SubscriberLog for MemoryLog {
    async fn load(&self) -> RateResult<Vec<String>> {
        Ok(self.records().await)
    }

    async fn append(&self, record: &str) -> RateResult<()> {
        let mut records = self.records.lock().await;
        debug!("Appended subscriber record");
        records.push(record.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_log_append_and_load() {
        let log = MemoryLog::with_records(["a@x.com"]);
        log.append("b@x.com").await.unwrap();
        assert_eq!(log.load().await.unwrap(), vec!["a@x.com", "b@x.com"]);
    }
}
