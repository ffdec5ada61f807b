use crate::core::AssetPriceProvider;
use crate::core::error::{RateError, RateResult};
use crate::providers::http::{RateSourceClient, UpstreamRequest};
use async_trait::async_trait;
use tracing::instrument;

const SOURCE_NAME: &str = "coindesk";

/// Bitcoin price index from the CoinDesk BPI endpoint.
pub struct CoindeskPriceProvider {
    base_url: String,
    client: RateSourceClient,
}

impl CoindeskPriceProvider {
    pub fn new(base_url: &str, client: RateSourceClient) -> Self {
        CoindeskPriceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn request_for(&self, currency: &str) -> UpstreamRequest {
        let currency = currency.to_uppercase();
        UpstreamRequest::new(
            SOURCE_NAME,
            format!("{}/v1/bpi/currentprice.json", self.base_url),
            &["bpi", currency.as_str(), "rate_float"],
        )
    }
}

#[async_trait]
impl AssetPriceProvider for CoindeskPriceProvider {
    #[instrument(name = "CoindeskPriceFetch", skip(self))]
    async fn fetch_price(&self, asset: &str, currency: &str) -> RateResult<f64> {
        if !asset.eq_ignore_ascii_case("BTC") {
            return Err(RateError::UnsupportedAsset {
                source_name: SOURCE_NAME.to_string(),
                asset: asset.to_string(),
            });
        }
        self.client.fetch(&self.request_for(currency)).await
    }
}
