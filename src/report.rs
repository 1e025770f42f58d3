//! Report writer.
//!
//! Serializes the final shortlist to a date-stamped CSV file, one row per
//! surviving record in valuation-rank order.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::Writer;
use tracing::info;

use crate::error::ScreenerError;
use crate::models::RecordSet;

const REPORT_SUFFIX: &str = "most_valuable_stocks.csv";

/// Cap on report rows; the shortlist is already truncated upstream, this
/// only guards against a caller passing an unfiltered set.
const MAX_ROWS: usize = 20;

/// Write the shortlist to `<output_dir>/<YYYY-MM-DD>-most_valuable_stocks.csv`
/// and return the path of the written file.
pub fn write_report(
    set: &RecordSet,
    output_dir: &Path,
    run_date: NaiveDate,
) -> Result<PathBuf, ScreenerError> {
    let filename = format!("{}-{}", run_date.format("%Y-%m-%d"), REPORT_SUFFIX);
    let path = output_dir.join(filename);

    let mut writer = Writer::from_path(&path)?;
    for record in set.iter().take(MAX_ROWS) {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Report written to {:?} ({} rows)", path, set.len().min(MAX_ROWS));
    Ok(path)
}
