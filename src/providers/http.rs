//! Leaf client that pulls one numeric field out of an upstream JSON response.

use crate::core::error::{RateError, RateResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("ratecast/", env!("CARGO_PKG_VERSION"));

/// Describes one upstream call: where to send it and which field to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub source_name: String,
    pub url: String,
    pub field_path: Vec<String>,
}

impl UpstreamRequest {
    pub fn new(source_name: &str, url: String, field_path: &[&str]) -> Self {
        Self {
            source_name: source_name.to_string(),
            url,
            field_path: field_path.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Dotted form of the field path, used in diagnostics.
    pub fn field(&self) -> String {
        self.field_path.join(".")
    }

    fn unavailable(&self, reason: String) -> RateError {
        RateError::UpstreamUnavailable {
            source_name: self.source_name.clone(),
            url: self.url.clone(),
            reason,
        }
    }

    fn malformed(&self) -> RateError {
        RateError::UpstreamMalformed {
            source_name: self.source_name.clone(),
            url: self.url.clone(),
            field: self.field(),
        }
    }
}

/// Fetches single quantities over HTTP. Never retries.
#[derive(Clone)]
pub struct RateSourceClient {
    client: Client,
}

impl RateSourceClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    #[instrument(
        name = "RateSourceFetch",
        skip(self, request),
        fields(source = %request.source_name, url = %request.url)
    )]
    pub async fn fetch(&self, request: &UpstreamRequest) -> RateResult<f64> {
        debug!("Requesting {}", request.field());
        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| request.unavailable(format!("Request error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(request.unavailable(format!("HTTP error: {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| request.unavailable(format!("Failed to read body: {e}")))?;

        let data: Value = serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, response = %text, "Response is not JSON");
            request.malformed()
        })?;

        let quantity = extract_number(&data, &request.field_path).ok_or_else(|| {
            debug!(response = %text, "Expected field is absent or not numeric");
            request.malformed()
        })?;
        debug!(quantity, "Received quantity");
        Ok(quantity)
    }
}

/// Walks `path` through `value` and reads a finite number at the end.
///
/// Numeric strings are accepted since some providers quote decimals as text.
pub(crate) fn extract_number(value: &Value, path: &[String]) -> Option<f64> {
    let leaf = path
        .iter()
        .try_fold(value, |node, segment| node.get(segment.as_str()))?;
    let number = match leaf {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
