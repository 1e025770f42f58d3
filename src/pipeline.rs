//! End-to-end run orchestration: fetch, normalize, filter, verify, report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::bankruptcy::BankruptcyVerifier;
use crate::filter::apply_financial_filters;
use crate::models::Config;
use crate::normalizer::normalize;
use crate::report::write_report;
use crate::scraper::IndicatorsClient;

/// Run the whole pipeline once and return the path of the written report.
///
/// Every fatal condition surfaces here with the failing stage named; no
/// partial report is written after a failure.
pub async fn run(config: Config) -> Result<PathBuf> {
    let today = Local::now().date_naive();

    let indicators = IndicatorsClient::new(&config)?;
    let tables = indicators
        .fetch_raw_tables(today)
        .await
        .context("fetching the indicators table")?;

    let records = normalize(&tables).context("normalizing scraped records")?;
    info!("Normalized {} records", records.len());

    let verifier = BankruptcyVerifier::new(&config)?;
    let shortlist = apply_financial_filters(records, &verifier, config.min_financial_volume)
        .await
        .context("applying financial filters")?;

    let path = write_report(&shortlist, Path::new(&config.output_dir), today)
        .context("writing the report")?;

    Ok(path)
}
