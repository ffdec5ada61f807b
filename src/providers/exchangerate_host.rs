use crate::core::CurrencyRateProvider;
use crate::core::error::RateResult;
use crate::providers::http::{RateSourceClient, UpstreamRequest};
use async_trait::async_trait;
use tracing::instrument;

const SOURCE_NAME: &str = "exchangerate.host";

/// Latest fiat conversion rates from exchangerate.host.
pub struct ExchangeRateHostProvider {
    base_url: String,
    client: RateSourceClient,
}

impl ExchangeRateHostProvider {
    pub fn new(base_url: &str, client: RateSourceClient) -> Self {
        ExchangeRateHostProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn request_for(&self, from: &str, to: &str) -> UpstreamRequest {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        UpstreamRequest::new(
            SOURCE_NAME,
            format!("{}/latest?base={from}", self.base_url),
            &["rates", to.as_str()],
        )
    }
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateHostProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> RateResult<f64> {
        self.client.fetch(&self.request_for(from, to)).await
    }
}
