//! Currency conversion abstractions

use crate::core::error::RateResult;
use async_trait::async_trait;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Returns how many units of `to` one unit of `from` buys.
    async fn get_rate(&self, from: &str, to: &str) -> RateResult<f64>;
}
