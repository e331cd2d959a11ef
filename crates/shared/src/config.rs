//! Application configuration management.

use serde::Deserialize;

use crate::types::company::normalize_country_code;
use crate::types::{CompanyId, CompanyProfile, Currency};

/// Upper bound for the error message stored on a failed run.
pub const MAX_RUN_ERROR_CHARS: usize = 200;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Billing engine configuration.
    #[serde(default)]
    pub billing: BillingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Billing engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Company identifier; generated when absent.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    /// Home tax jurisdiction (ISO 3166-1 alpha-2).
    #[serde(default = "default_home_country_code")]
    pub home_country_code: String,
    /// Default document currency.
    #[serde(default)]
    pub currency: Currency,
    /// Maximum characters kept from a failure message in the run ledger.
    #[serde(default = "default_run_error_max_chars")]
    pub run_error_max_chars: usize,
    /// Invoice number prefix.
    #[serde(default = "default_invoice_number_prefix")]
    pub invoice_number_prefix: String,
    /// Credit note number prefix.
    #[serde(default = "default_credit_note_number_prefix")]
    pub credit_note_number_prefix: String,
    /// Header text for documents whose contract has none.
    #[serde(default)]
    pub default_header_text: Option<String>,
    /// Footer text for documents whose contract has none.
    #[serde(default)]
    pub default_footer_text: Option<String>,
}

fn default_home_country_code() -> String {
    "DE".to_string()
}

fn default_run_error_max_chars() -> usize {
    MAX_RUN_ERROR_CHARS
}

fn default_invoice_number_prefix() -> String {
    "RE".to_string()
}

fn default_credit_note_number_prefix() -> String {
    "GS".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            company_id: None,
            home_country_code: default_home_country_code(),
            currency: Currency::default(),
            run_error_max_chars: default_run_error_max_chars(),
            invoice_number_prefix: default_invoice_number_prefix(),
            credit_note_number_prefix: default_credit_note_number_prefix(),
            default_header_text: None,
            default_footer_text: None,
        }
    }
}

impl BillingConfig {
    /// Builds the explicit company profile passed to the engine.
    #[must_use]
    pub fn company_profile(&self) -> CompanyProfile {
        CompanyProfile {
            id: self.company_id.unwrap_or_default(),
            home_country_code: normalize_country_code(&self.home_country_code),
            currency: self.currency,
            invoice_number_prefix: self.invoice_number_prefix.clone(),
            credit_note_number_prefix: self.credit_note_number_prefix.clone(),
            default_header_text: self.default_header_text.clone(),
            default_footer_text: self.default_footer_text.clone(),
        }
    }

    /// Ledger message limit, never above [`MAX_RUN_ERROR_CHARS`].
    #[must_use]
    pub fn effective_run_error_max_chars(&self) -> usize {
        self.run_error_max_chars.min(MAX_RUN_ERROR_CHARS)
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("BILLRUN")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}
