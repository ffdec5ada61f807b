//! Fans the current rate out to every subscriber.

use crate::core::aggregator::RateAggregator;
use crate::core::email::SubscriberEmail;
use crate::core::error::{RateError, RateResult};
use crate::core::mail::{MailMessage, MailTransport};
use crate::core::quote::RateQuote;
use crate::core::registry::SubscriberRegistry;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

/// Subject and body used for every notification.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub subject: String,
    /// Supports `{rate}`, `{base}`, `{quote}` and `{fetched_at}`.
    pub body: String,
}

impl MessageTemplate {
    pub fn render(&self, quote: &RateQuote) -> String {
        self.body
            .replace("{rate}", &format!("{:.2}", quote.rate))
            .replace("{base}", &quote.base_asset)
            .replace("{quote}", &quote.quote_currency)
            .replace("{fetched_at}", &quote.fetched_at.to_rfc3339())
    }
}

/// A quote together with the recipients snapshot taken when it was dispatched.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub quote: RateQuote,
    pub recipients: Vec<SubscriberEmail>,
}

impl NotificationJob {
    fn messages(&self, template: &MessageTemplate) -> Vec<MailMessage> {
        let body = template.render(&self.quote);
        self.recipients
            .iter()
            .map(|recipient| MailMessage {
                recipients: vec![recipient.to_string()],
                subject: template.subject.clone(),
                body: body.clone(),
            })
            .collect()
    }
}

/// Totals for one finished dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub submitted: usize,
    pub failed: usize,
}

/// Acknowledgement that a dispatch was accepted for processing.
///
/// Submissions run on a detached task. Dropping the handle does not cancel
/// them; awaiting [`DispatchHandle::wait`] is only needed to observe the
/// report.
#[derive(Debug)]
pub struct DispatchHandle {
    pub accepted: usize,
    pub quote: RateQuote,
    task: JoinHandle<DispatchReport>,
}

impl DispatchHandle {
    pub async fn wait(self) -> anyhow::Result<DispatchReport> {
        Ok(self.task.await?)
    }
}

pub struct Dispatcher {
    registry: Arc<SubscriberRegistry>,
    aggregator: Arc<RateAggregator>,
    transport: Arc<dyn MailTransport>,
    template: MessageTemplate,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        aggregator: Arc<RateAggregator>,
        transport: Arc<dyn MailTransport>,
        template: MessageTemplate,
    ) -> Self {
        Self {
            registry,
            aggregator,
            transport,
            template,
        }
    }

    /// Computes the rate and submits it to every subscriber in the background.
    ///
    /// Fails without submitting anything when there are no subscribers or
    /// the rate cannot be computed. Returns as soon as the submissions are
    /// scheduled.
    pub async fn dispatch(&self, base_asset: &str, quote_currency: &str) -> RateResult<DispatchHandle> {
        let recipients = self.registry.list_all().await;
        if recipients.is_empty() {
            warn!("Dispatch requested with no subscribers");
            return Err(RateError::NoSubscribers);
        }

        let quote = self.aggregator.compute_rate(base_asset, quote_currency).await?;
        let job = NotificationJob { quote, recipients };
        let messages = job.messages(&self.template);
        let accepted = messages.len();
        info!(accepted, rate = job.quote.rate, "Dispatch accepted");

        let transport = Arc::clone(&self.transport);
        let span = info_span!("Dispatch", recipients = accepted);
        let task = tokio::spawn(submit_all(transport, messages).instrument(span));

        Ok(DispatchHandle {
            accepted,
            quote: job.quote,
            task,
        })
    }
}

async fn submit_all(transport: Arc<dyn MailTransport>, messages: Vec<MailMessage>) -> DispatchReport {
    let mut report = DispatchReport::default();
    for message in &messages {
        match transport.send(message).await {
            Ok(()) => {
                debug!(to = ?message.recipients, "Message submitted");
                report.submitted += 1;
            }
            Err(e) => {
                warn!(to = ?message.recipients, error = %e, "Message submission failed");
                report.failed += 1;
            }
        }
    }
    info!(submitted = report.submitted, failed = report.failed, "Dispatch finished");
    report
}
