use crate::core::config::MailConfig;
use crate::core::error::{RateError, RateResult};
use crate::core::mail::{MailMessage, MailTransport};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Mail transport speaking a Postmark-style JSON email API.
pub struct MailApiTransport {
    client: Client,
    base_url: String,
    sender: String,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: String,
    subject: &'a str,
    text_body: &'a str,
}

impl MailApiTransport {
    pub fn new(config: &MailConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let sender = match &config.sender_name {
            Some(name) => format!("{name} <{}>", config.sender),
            None => config.sender.clone(),
        };
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sender,
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for MailApiTransport {
    #[instrument(name = "MailApiSend", skip(self, message), fields(recipients = message.recipients.len()))]
    async fn send(&self, message: &MailMessage) -> RateResult<()> {
        let to = message.recipients.join(", ");
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: &self.sender,
            to: to.clone(),
            subject: &message.subject,
            text_body: &message.body,
        };

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| RateError::MailUnavailable(format!("Request error: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RateError::MailUnavailable(format!("HTTP error: {status}")));
        }
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(RateError::MailRejected {
                recipient: to,
                reason: format!("{status} {reason}").trim().to_string(),
            });
        }
        debug!("Mail accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> MailConfig {
        MailConfig {
            base_url: server.uri(),
            sender: "rates@example.com".to_string(),
            sender_name: Some("Rates".to_string()),
            token: "token-123".to_string(),
            ..Default::default()
        }
    }

    fn message() -> MailMessage {
        MailMessage {
            recipients: vec!["a@x.com".to_string()],
            subject: "Latest BTC rate".to_string(),
            body: "The current bitcoin price: 1850000.00 UAH".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_expected_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .and(header(TOKEN_HEADER, "token-123"))
            .and(body_partial_json(serde_json::json!({
                "From": "Rates <rates@example.com>",
                "To": "a@x.com",
                "Subject": "Latest BTC rate",
                "TextBody": "The current bitcoin price: 1850000.00 UAH"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = MailApiTransport::new(&config(&server)).unwrap();
        transport.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_client_error_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Invalid 'To' address"))
            .mount(&server)
            .await;

        let transport = MailApiTransport::new(&config(&server)).unwrap();
        let err = transport.send(&message()).await.unwrap_err();
        match err {
            RateError::MailRejected { recipient, reason } => {
                assert_eq!(recipient, "a@x.com");
                assert!(reason.contains("Invalid 'To' address"));
            }
            other => panic!("Expected MailRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = MailApiTransport::new(&config(&server)).unwrap();
        let err = transport.send(&message()).await.unwrap_err();
        assert!(matches!(err, RateError::MailUnavailable(_)));
    }
}
