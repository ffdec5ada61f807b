//! Composes an asset price and a currency conversion into one derived rate.

use crate::core::error::{RateError, RateResult};
use crate::core::quote::RateQuote;
use crate::core::{AssetPriceProvider, CurrencyRateProvider};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Prices an asset in any quote currency by going through a reference
/// currency the asset is directly quoted in.
pub struct RateAggregator {
    price_provider: Arc<dyn AssetPriceProvider>,
    currency_provider: Arc<dyn CurrencyRateProvider>,
    reference_currency: String,
}

impl RateAggregator {
    pub fn new(
        price_provider: Arc<dyn AssetPriceProvider>,
        currency_provider: Arc<dyn CurrencyRateProvider>,
        reference_currency: &str,
    ) -> Self {
        Self {
            price_provider,
            currency_provider,
            reference_currency: reference_currency.to_uppercase(),
        }
    }

    pub fn reference_currency(&self) -> &str {
        &self.reference_currency
    }

    /// Fetches both legs concurrently and multiplies them.
    ///
    /// The first leg to fail decides the error; no quote is built from a
    /// single leg.
    #[instrument(name = "ComputeRate", skip(self))]
    pub async fn compute_rate(&self, base_asset: &str, quote_currency: &str) -> RateResult<RateQuote> {
        let base_asset = base_asset.to_uppercase();
        let quote_currency = quote_currency.to_uppercase();

        let (source_rate, conversion_rate) = futures::try_join!(
            self.price_provider
                .fetch_price(&base_asset, &self.reference_currency),
            self.currency_provider
                .get_rate(&self.reference_currency, &quote_currency),
        )?;

        let quote = RateQuote::new(
            &base_asset,
            &self.reference_currency,
            &quote_currency,
            source_rate,
            conversion_rate,
        );
        if !quote.rate.is_finite() {
            return Err(RateError::UpstreamMalformed {
                source_name: "aggregate".to_string(),
                url: format!("{base_asset}/{}/{quote_currency}", self.reference_currency),
                field: "rate".to_string(),
            });
        }
        debug!(
            source_rate,
            conversion_rate,
            rate = quote.rate,
            "Computed rate"
        );
        Ok(quote)
    }
}
