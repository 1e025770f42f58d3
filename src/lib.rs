pub mod bankruptcy;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod scraper;

pub use error::ScreenerError;
pub use models::{Config, RecordSet, StockRecord};
