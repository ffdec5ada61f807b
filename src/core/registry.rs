//! Deduplicated, durable set of subscriber addresses.

use crate::core::email::SubscriberEmail;
use crate::core::error::RateResult;
use crate::core::storage::SubscriberLog;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Outcome of a registration that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyPresent,
}

#[derive(Default)]
struct Mirror {
    known: HashSet<SubscriberEmail>,
    ordered: Vec<SubscriberEmail>,
}

impl Mirror {
    fn insert(&mut self, email: SubscriberEmail) -> bool {
        if self.known.insert(email.clone()) {
            self.ordered.push(email);
            true
        } else {
            false
        }
    }
}

/// Subscriber registry backed by an append-only log.
///
/// The in-memory mirror is rebuilt from the log on open. Every registration
/// holds the mirror lock across the durable append, so the duplicate check
/// and the write form one critical section and the mirror only ever holds
/// entries that are already on durable storage.
pub struct SubscriberRegistry {
    log: Arc<dyn SubscriberLog>,
    mirror: Mutex<Mirror>,
}

impl SubscriberRegistry {
    /// Replays `log` and returns a registry positioned after its last record.
    pub async fn open(log: Arc<dyn SubscriberLog>) -> RateResult<Self> {
        let records = log.load().await?;
        let mut mirror = Mirror::default();
        let mut duplicates = 0usize;
        for record in &records {
            if !mirror.insert(SubscriberEmail::from_record(record)) {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(duplicates, "Subscriber log contains duplicate records, keeping first");
        }
        info!(subscribers = mirror.ordered.len(), "Subscriber registry ready");

        Ok(Self {
            log,
            mirror: Mutex::new(mirror),
        })
    }

    /// Adds `email` unless an equal address is already registered.
    ///
    /// `Added` is only returned after the record is durable. On a storage
    /// failure the registry is unchanged and the error is returned.
    #[instrument(name = "Register", skip(self, email), fields(email = %email))]
    pub async fn register(&self, email: &SubscriberEmail) -> RateResult<Registration> {
        let mut mirror = self.mirror.lock().await;
        if mirror.known.contains(email) {
            debug!("Subscriber already present");
            return Ok(Registration::AlreadyPresent);
        }

        self.log.append(email.as_ref()).await?;
        mirror.insert(email.clone());
        info!("Subscriber added");
        Ok(Registration::Added)
    }

    /// Snapshot of every registered address in registration order.
    pub async fn list_all(&self) -> Vec<SubscriberEmail> {
        self.mirror.lock().await.ordered.clone()
    }

    pub async fn len(&self) -> usize {
        self.mirror.lock().await.ordered.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RateError;
    use crate::store::file::FileLog;
    use crate::store::memory::MemoryLog;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    fn email(s: &str) -> SubscriberEmail {
        SubscriberEmail::parse(s).unwrap()
    }

    struct FlakyLog {
        inner: MemoryLog,
        fail: AtomicBool,
    }

    #[async_trait]
    impl SubscriberLog for FlakyLog {
        async fn load(&self) -> RateResult<Vec<String>> {
            self.inner.load().await
        }

        async fn append(&self, record: &str) -> RateResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RateError::StorageUnavailable("disk full".to_string()));
            }
            self.inner.append(record).await
        }
    }

    #[tokio::test]
    async fn test_register_twice_is_idempotent() {
        let log = Arc::new(MemoryLog::new());
        let registry = SubscriberRegistry::open(log.clone()).await.unwrap();

        let a = email("a@x.com");
        assert_eq!(registry.register(&a).await.unwrap(), Registration::Added);
        assert_eq!(
            registry.register(&a).await.unwrap(),
            Registration::AlreadyPresent
        );
        assert_eq!(log.records().await, vec!["a@x.com"]);
    }

    #[tokio::test]
    async fn test_identity_ignores_case_and_whitespace() {
        let log = Arc::new(MemoryLog::new());
        let registry = SubscriberRegistry::open(log.clone()).await.unwrap();

        registry.register(&email("a@x.com")).await.unwrap();
        assert_eq!(
            registry.register(&email(" A@X.COM ")).await.unwrap(),
            Registration::AlreadyPresent
        );
        assert_eq!(log.records().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_add_once() {
        let dir = tempdir().unwrap();
        let log = Arc::new(FileLog::new(dir.path().join("db.txt")));
        let registry = Arc::new(SubscriberRegistry::open(log.clone()).await.unwrap());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.register(&email("a@x.com")).await })
            })
            .collect();

        let mut added = 0;
        let mut present = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Registration::Added => added += 1,
                Registration::AlreadyPresent => present += 1,
            }
        }
        assert_eq!(added, 1);
        assert_eq!(present, 31);
        assert_eq!(log.load().await.unwrap(), vec!["a@x.com"]);
    }

    #[tokio::test]
    async fn test_open_replays_log_and_drops_duplicates() {
        let log = Arc::new(MemoryLog::with_records(["a@x.com", "b@x.com", "A@x.com"]));
        let registry = SubscriberRegistry::open(log).await.unwrap();

        assert_eq!(registry.list_all().await, vec![email("a@x.com"), email("b@x.com")]);
        assert_eq!(
            registry.register(&email("b@x.com")).await.unwrap(),
            Registration::AlreadyPresent
        );
    }

    #[tokio::test]
    async fn test_list_all_keeps_registration_order() {
        let registry = SubscriberRegistry::open(Arc::new(MemoryLog::new()))
            .await
            .unwrap();
        assert!(registry.is_empty().await);

        for s in ["c@x.com", "a@x.com", "b@x.com"] {
            registry.register(&email(s)).await.unwrap();
        }
        let listed: Vec<String> = registry
            .list_all()
            .await
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(listed, vec!["c@x.com", "a@x.com", "b@x.com"]);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn test_storage_failure_is_surfaced_and_not_mirrored() {
        let log = Arc::new(FlakyLog {
            inner: MemoryLog::new(),
            fail: AtomicBool::new(true),
        });
        let registry = SubscriberRegistry::open(log.clone()).await.unwrap();

        let a = email("a@x.com");
        let result = registry.register(&a).await;
        assert!(matches!(result, Err(RateError::StorageUnavailable(_))));
        assert!(registry.is_empty().await);

        // Once storage recovers the same address can still be added.
        log.fail.store(false, Ordering::SeqCst);
        assert_eq!(registry.register(&a).await.unwrap(), Registration::Added);
    }

    #[tokio::test]
    async fn test_interrupted_append_leaves_no_partial_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.txt");
        {
            let registry = SubscriberRegistry::open(Arc::new(FileLog::new(&path)))
                .await
                .unwrap();
            registry.register(&email("a@x.com")).await.unwrap();
        }
        // Simulate a crash halfway through writing the next record.
        {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&path)
                .unwrap();
            file.write_all(b"b@x.c").unwrap();
        }

        let registry = SubscriberRegistry::open(Arc::new(FileLog::new(&path)))
            .await
            .unwrap();
        assert_eq!(registry.list_all().await, vec![email("a@x.com")]);

        assert_eq!(
            registry.register(&email("b@x.com")).await.unwrap(),
            Registration::Added
        );
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a@x.com\nb@x.com\n"
        );
    }

    #[tokio::test]
    async fn test_fragment_from_failed_append_does_not_corrupt_next_registration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.txt");
        let registry = SubscriberRegistry::open(Arc::new(FileLog::new(&path)))
            .await
            .unwrap();
        registry.register(&email("alice@example.com")).await.unwrap();

        // A failed append in this process left part of a record behind.
        {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&path)
                .unwrap();
            file.write_all(b"bob@").unwrap();
        }
        assert_eq!(
            registry.register(&email("carol@example.com")).await.unwrap(),
            Registration::Added
        );

        let reopened = SubscriberRegistry::open(Arc::new(FileLog::new(&path)))
            .await
            .unwrap();
        assert_eq!(
            reopened.list_all().await,
            vec![email("alice@example.com"), email("carol@example.com")]
        );
    }
}
