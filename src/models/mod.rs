use serde::Serialize;

/// One normalized indicator row for a single share class.
///
/// All numeric fields are finite; the normalizer coerces unparseable cells
/// to zero before records reach the filter engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    #[serde(rename = "Stock")]
    pub stock: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "EBIT_Margin_(%)")]
    pub ebit_margin_pct: f64,
    #[serde(rename = "EV_EBIT")]
    pub ev_ebit: f64,
    #[serde(rename = "Dividend_Yield_(%)")]
    pub dividend_yield_pct: f64,
    #[serde(rename = "Financial_Volume_(%)")]
    pub financial_volume: i64,
}

/// Ordered working set of records. Each filter stage consumes and returns
/// it by value; sorting is a side effect of the stage, not a view.
pub type RecordSet = Vec<StockRecord>;

/// The leading four characters of a ticker identify the issuing company
/// across share classes (ordinary vs preferred).
pub fn issuer_root(ticker: &str) -> &str {
    ticker.get(..4).unwrap_or(ticker)
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Read the raw indicators page from `cache_path` instead of the network.
    pub use_cached_dataset: bool,
    pub cache_path: String,
    pub min_financial_volume: i64,
    pub worker_count: usize,
    pub fetch_timeout_secs: u64,
    /// When true, a failed per-ticker bankruptcy lookup aborts the run.
    /// When false, the ticker is skipped with a warning.
    pub strict_bankruptcy: bool,
    pub debug_worker_logging: bool,
    pub output_dir: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            use_cached_dataset: std::env::var("USE_CACHED_DATASET")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cache_path: std::env::var("CACHE_PATH")
                .unwrap_or_else(|_| "indicators_cache.html".to_string()),
            min_financial_volume: std::env::var("MIN_FINANCIAL_VOLUME")
                .unwrap_or_else(|_| "1000000".to_string())
                .parse()
                .unwrap_or(1_000_000),
            worker_count: std::env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            strict_bankruptcy: std::env::var("STRICT_BANKRUPTCY")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            debug_worker_logging: std::env::var("DEBUG_WORKER_LOGGING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            use_cached_dataset: false,
            cache_path: "indicators_cache.html".to_string(),
            min_financial_volume: 1_000_000,
            worker_count: 4,
            fetch_timeout_secs: 30,
            strict_bankruptcy: true,
            debug_worker_logging: false,
            output_dir: ".".to_string(),
        }
    }
}
