//! Durable subscriber log abstraction

use crate::core::error::RateResult;
use async_trait::async_trait;

/// An append-only record log holding one subscriber identity per record.
///
/// Implementations must make `append` durable before returning `Ok`, and
/// `load` must only ever yield complete records.
#[async_trait]
pub trait SubscriberLog: Send + Sync {
    /// Reads every complete record in append order.
    async fn load(&self) -> RateResult<Vec<String>>;

    /// Appends one record.
    async fn append(&self, record: &str) -> RateResult<()>;
}
