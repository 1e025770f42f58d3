use thiserror::Error;

/// Error taxonomy for the screener pipeline.
///
/// Every variant is fatal: the run terminates after a diagnostic naming the
/// failing stage, and no partial report is written.
#[derive(Debug, Error)]
pub enum ScreenerError {
    /// The scrape result had no tables, or lacked the second table that
    /// carries the indicator rows.
    #[error("scrape result is empty or missing the indicators table")]
    EmptyInput,

    /// A required column was absent from the indicators table header.
    #[error("required column '{column}' is missing from the indicators table")]
    MalformedRow { column: String },

    /// A filter stage was invoked with no records left. The pipeline has no
    /// meaningful recovery from "no candidates survived" mid-stream.
    #[error("no records left entering the {0} stage")]
    EmptyDataset(&'static str),

    /// Negative liquidity threshold. Operator misconfiguration, not a data
    /// error.
    #[error("invalid liquidity threshold {0}: must be non-negative")]
    InvalidThreshold(i64),

    /// Worker partition bounds that do not cover the candidate list.
    #[error("invalid worker partition: {0}")]
    InvalidPartition(String),

    /// The status cell was not found on a fetched company detail page.
    #[error("status cell not found on the detail page for {0}")]
    StatusElementNotFound(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("could not write the report: {0}")]
    Report(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
