//! Billrun recurring billing run.
//!
//! Usage:
//!   billrun              - bill every contract due today (UTC)
//!   billrun 2026-01-31   - bill every contract due on or before the given date
//!
//! Meant to be invoked once per day by cron or a scheduler. The exit status
//! is non-zero only when the pass cannot run at all; per-contract failures
//! are recorded in the run ledger.

use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use billrun_core::contract::ContractBillingRunner;
use billrun_db::{BillingRepository, connect};
use billrun_shared::{AppConfig, AppError};

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "billrun=info".into()))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

fn parse_as_of(arg: Option<String>) -> anyhow::Result<NaiveDate> {
    match arg {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid AS_OF_DATE {raw:?}, expected YYYY-MM-DD")),
        None => Ok(Utc::now().date_naive()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let as_of = parse_as_of(std::env::args().nth(1))?;
    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let repository = Arc::new(BillingRepository::new(db));
    let runner = ContractBillingRunner::new(
        repository.clone(),
        repository.clone(),
        repository,
        config.billing.company_profile(),
        config.billing.effective_run_error_max_chars(),
    );

    let summary = match runner.run_due_billing(as_of).await {
        Ok(summary) => summary,
        Err(e) => {
            let err = AppError::from(e);
            error!(%as_of, error_code = err.error_code(), error = %err, "Billing run aborted");
            return Err(err.into());
        }
    };

    if summary.is_clean() {
        info!(
            %as_of,
            processed = summary.processed,
            documents = summary.document_ids.len(),
            "Billing run completed"
        );
    } else {
        warn!(
            %as_of,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            unrecorded = summary.unrecorded,
            "Billing run completed with failures, see the run ledger"
        );
    }

    Ok(())
}
