use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use tracing::debug;

/// Overrides `mail.token` so the secret can stay out of the config file.
pub const MAIL_TOKEN_ENV: &str = "RATECAST_MAIL_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoindeskProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub coindesk: CoindeskProviderConfig,
    pub exchangerate: ExchangeRateProviderConfig,
    pub timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coindesk: CoindeskProviderConfig {
                base_url: "https://api.coindesk.com".to_string(),
            },
            exchangerate: ExchangeRateProviderConfig {
                base_url: "https://api.exchangerate.host".to_string(),
            },
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RateConfig {
    pub base_asset: String,
    pub reference_currency: String,
    pub quote_currency: String,
}

impl Default for RateConfig {
    fn default() -> Self {
        RateConfig {
            base_asset: "BTC".to_string(),
            reference_currency: "USD".to_string(),
            quote_currency: "UAH".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Newline-delimited text file.
    #[default]
    File,
    Fjall,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Defaults to the project data directory when unset.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MailConfig {
    pub base_url: String,
    pub sender: String,
    pub sender_name: Option<String>,
    pub token: String,
    pub subject: String,
    /// Supports `{rate}`, `{base}`, `{quote}` and `{fetched_at}`.
    pub body_template: String,
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            base_url: "https://api.postmarkapp.com".to_string(),
            sender: "rates@example.com".to_string(),
            sender_name: None,
            token: String::new(),
            subject: "Latest BTC rate".to_string(),
            body_template: "The current bitcoin price: {rate} {quote}".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub rate: RateConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Loads the config from the default location, or defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            let mut config = Self::default();
            config.apply_env_overrides();
            return Ok(config);
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "ratecast", "ratecast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Where the subscriber log lives for the configured backend.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.storage.path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "ratecast", "ratecast")
            .context("Could not determine project directories")?;
        let data_dir = proj_dirs.data_dir();
        Ok(match self.storage.backend {
            StorageBackend::File => data_dir.join("db.txt"),
            StorageBackend::Fjall => data_dir.join("subscribers"),
        })
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_env_overrides();
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn from_yaml(config_str: &str) -> Result<Self> {
        // An empty document deserializes to `null`; treat it as all defaults.
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(config_str)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var(MAIL_TOKEN_ENV)
            && !token.is_empty()
        {
            debug!("Using mail token from {MAIL_TOKEN_ENV}");
            self.mail.token = token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  coindesk:
    base_url: "http://example.com/coindesk"
  exchangerate:
    base_url: "http://example.com/fx"
  timeout_secs: 3
rate:
  base_asset: "BTC"
  reference_currency: "USD"
  quote_currency: "EUR"
storage:
  backend: fjall
  path: "/tmp/ratecast"
mail:
  base_url: "http://example.com/mail"
  sender: "me@example.com"
  token: "secret"
  subject: "Rate"
  body_template: "{base} is {rate} {quote}"
"#;

        let config = AppConfig::from_yaml(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.providers.coindesk.base_url,
            "http://example.com/coindesk"
        );
        assert_eq!(config.providers.exchangerate.base_url, "http://example.com/fx");
        assert_eq!(config.providers.timeout_secs, 3);
        assert_eq!(config.rate.quote_currency, "EUR");
        assert_eq!(config.storage.backend, StorageBackend::Fjall);
        assert_eq!(
            config.storage_path().unwrap(),
            PathBuf::from("/tmp/ratecast")
        );
        assert_eq!(config.mail.sender, "me@example.com");
        assert_eq!(config.mail.token, "secret");
        // Unset fields fall back to defaults.
        assert!(config.mail.sender_name.is_none());
        assert_eq!(config.mail.timeout_secs, 10);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::from_yaml("rate:\n  quote_currency: PLN\n").unwrap();
        assert_eq!(config.rate.base_asset, "BTC");
        assert_eq!(config.rate.reference_currency, "USD");
        assert_eq!(config.rate.quote_currency, "PLN");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(
            config.providers.coindesk.base_url,
            "https://api.coindesk.com"
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = AppConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.rate.quote_currency, "UAH");
        assert_eq!(config.mail.subject, "Latest BTC rate");
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(AppConfig::from_yaml("storage:\n  backend: sqlite\n").is_err());
    }
}
