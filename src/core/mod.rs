//! Core business logic abstractions

pub mod aggregator;
pub mod config;
pub mod currency;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod log;
pub mod mail;
pub mod price;
pub mod quote;
pub mod registry;
pub mod storage;

// Re-export main types for cleaner imports
pub use currency::CurrencyRateProvider;
pub use email::SubscriberEmail;
pub use error::{RateError, RateResult};
pub use price::AssetPriceProvider;
pub use quote::RateQuote;
pub use registry::{Registration, SubscriberRegistry};
