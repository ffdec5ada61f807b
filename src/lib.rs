pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::aggregator::RateAggregator;
use crate::core::config::AppConfig;
use crate::core::dispatcher::{Dispatcher, MessageTemplate};
use crate::core::registry::SubscriberRegistry;
use crate::providers::coindesk::CoindeskPriceProvider;
use crate::providers::exchangerate_host::ExchangeRateHostProvider;
use crate::providers::http::RateSourceClient;
use crate::providers::mail_api::MailApiTransport;
use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Rate {
        base: Option<String>,
        quote: Option<String>,
    },
    Subscribe {
        email: String,
    },
    Subscribers,
    SendEmails,
}

/// The wired-up rate, registry and dispatch components.
pub struct App {
    pub config: AppConfig,
    pub aggregator: Arc<RateAggregator>,
    pub registry: Arc<SubscriberRegistry>,
    pub dispatcher: Dispatcher,
}

impl App {
    pub async fn build(config: AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.providers.timeout_secs);
        let client = RateSourceClient::new(timeout).context("Failed to build HTTP client")?;

        let price_provider = Arc::new(CoindeskPriceProvider::new(
            &config.providers.coindesk.base_url,
            client.clone(),
        ));
        let currency_provider = Arc::new(ExchangeRateHostProvider::new(
            &config.providers.exchangerate.base_url,
            client,
        ));
        let aggregator = Arc::new(RateAggregator::new(
            price_provider,
            currency_provider,
            &config.rate.reference_currency,
        ));

        let log = store::open_log(&config)?;
        let registry = Arc::new(
            SubscriberRegistry::open(log)
                .await
                .context("Failed to open subscriber registry")?,
        );

        let transport =
            Arc::new(MailApiTransport::new(&config.mail).context("Failed to build mail client")?);
        let template = MessageTemplate {
            subject: config.mail.subject.clone(),
            body: config.mail.body_template.clone(),
        };
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&aggregator),
            transport,
            template,
        );

        Ok(Self {
            config,
            aggregator,
            registry,
            dispatcher,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<ExitCode> {
    info!("Ratecast starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::build(config).await?;
    match command {
        AppCommand::Rate { base, quote } => {
            cli::rate::run(&app, base.as_deref(), quote.as_deref()).await
        }
        AppCommand::Subscribe { email } => cli::subscribe::run(&app, &email).await,
        AppCommand::Subscribers => cli::subscribers::run(&app).await,
        AppCommand::SendEmails => cli::send::run(&app).await,
    }
}
