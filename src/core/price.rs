//! Asset pricing abstractions

use crate::core::error::RateResult;
use async_trait::async_trait;

#[async_trait]
pub trait AssetPriceProvider: Send + Sync {
    /// Returns the price of one unit of `asset` denominated in `currency`.
    async fn fetch_price(&self, asset: &str, currency: &str) -> RateResult<f64>;
}
