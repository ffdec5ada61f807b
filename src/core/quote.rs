use chrono::{DateTime, Utc};
use std::fmt::Display;

/// A derived rate and the two upstream quantities it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub base_asset: String,
    pub reference_currency: String,
    pub quote_currency: String,
    /// Price of the base asset in the reference currency.
    pub source_rate: f64,
    /// Units of quote currency per unit of reference currency.
    pub conversion_rate: f64,
    /// `source_rate * conversion_rate`
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}

impl RateQuote {
    pub fn new(
        base_asset: &str,
        reference_currency: &str,
        quote_currency: &str,
        source_rate: f64,
        conversion_rate: f64,
    ) -> Self {
        Self {
            base_asset: base_asset.to_string(),
            reference_currency: reference_currency.to_string(),
            quote_currency: quote_currency.to_string(),
            source_rate,
            conversion_rate,
            rate: source_rate * conversion_rate,
            fetched_at: Utc::now(),
        }
    }
}

impl Display for RateQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "1 {} = {:.2} {}",
            self.base_asset, self.rate, self.quote_currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_is_product_of_leaves() {
        let quote = RateQuote::new("BTC", "USD", "UAH", 50_000.0, 37.0);
        assert_eq!(quote.rate, 1_850_000.0);
        assert_eq!(quote.to_string(), "1 BTC = 1850000.00 UAH");
    }
}
