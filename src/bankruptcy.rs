//! Bankruptcy Verifier.
//!
//! For each shortlist candidate, visits the per-company detail page and
//! inspects the status cell of the company summary table. Tickers whose
//! status does not carry the operational marker are flagged for removal.
//!
//! The candidate list is split into contiguous near-equal chunks, one
//! async worker per chunk. Workers accumulate flags locally; the
//! coordinator joins them all and merges the locals into one unordered
//! set, so no shared state is mutated while workers run.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::error::ScreenerError;
use crate::models::Config;

/// Company detail endpoint; the ticker is appended to form a lookup URL.
const DETAIL_URL: &str = "https://www.investsite.com.br/principais_indicadores.php?cod_negociacao=";

/// Marker text identifying a company in normal operation. Anything else on
/// the status cell flags the ticker.
const OPERATIONAL_STATUS: &str = "FASE OPERACIONAL";

/// Verifies the operational status of shortlist candidates.
pub struct BankruptcyVerifier {
    client: Client,
    detail_url: String,
    worker_count: usize,
    strict: bool,
    debug_workers: bool,
}

impl BankruptcyVerifier {
    /// Create a new verifier
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent("b3-screener/0.1")
            .build()?;

        Ok(Self {
            client,
            detail_url: DETAIL_URL.to_string(),
            worker_count: config.worker_count,
            strict: config.strict_bankruptcy,
            debug_workers: config.debug_worker_logging,
        })
    }

    /// Point the verifier at a different detail endpoint. Used by tests.
    pub fn with_detail_url(mut self, detail_url: impl Into<String>) -> Self {
        self.detail_url = detail_url.into();
        self
    }

    /// Check every candidate and return the set of tickers NOT in
    /// operational phase.
    ///
    /// Fails before any fetch on an empty candidate list or an invalid
    /// worker partition. Per-ticker lookup failures abort the run in strict
    /// mode and are skipped with a warning otherwise.
    pub async fn verify(&self, tickers: &[String]) -> Result<HashSet<String>> {
        if tickers.is_empty() {
            return Err(ScreenerError::EmptyDataset("bankruptcy verification").into());
        }

        let chunks = partition(tickers.len(), self.worker_count)?;
        info!(
            "Verifying {} candidates across {} workers",
            tickers.len(),
            chunks.len()
        );

        let mut handles = Vec::new();

        for (worker_id, (start, end)) in chunks.into_iter().enumerate() {
            if self.debug_workers {
                info!("Worker {} scanning candidates {} to {}", worker_id, start, end);
            }

            let client = self.client.clone();
            let detail_url = self.detail_url.clone();
            let chunk: Vec<String> = tickers[start..end].to_vec();
            let strict = self.strict;

            handles.push(tokio::spawn(async move {
                scan_chunk(worker_id, client, detail_url, chunk, strict).await
            }));
        }

        // Join-all before touching any worker's results.
        let mut flagged = HashSet::new();
        for handle in handles {
            for ticker in handle.await?? {
                flagged.insert(ticker);
            }
        }

        info!("Found {} non-operational tickers", flagged.len());
        Ok(flagged)
    }
}

/// Scan one contiguous chunk of candidates, returning the tickers whose
/// detail page does not carry the operational marker.
async fn scan_chunk(
    worker_id: usize,
    client: Client,
    detail_url: String,
    tickers: Vec<String>,
    strict: bool,
) -> Result<Vec<String>, ScreenerError> {
    let mut flagged = Vec::new();

    for ticker in tickers {
        let url = format!("{}{}", detail_url, ticker);
        debug!("Worker {}: GET {}", worker_id, url);

        let body = match fetch_page(&client, &url).await {
            Ok(body) => body,
            Err(e) if strict => return Err(e),
            Err(e) => {
                warn!("Worker {}: skipping {}: {}", worker_id, ticker, e);
                continue;
            }
        };

        match extract_status(&body) {
            Some(status) => {
                if !status.contains(OPERATIONAL_STATUS) {
                    info!("Found {} in '{}', flagging for removal", ticker, status);
                    flagged.push(ticker);
                }
            }
            None if strict => {
                return Err(ScreenerError::StatusElementNotFound(ticker));
            }
            None => {
                warn!("Worker {}: no status cell for {}, skipping", worker_id, ticker);
            }
        }
    }

    Ok(flagged)
}

async fn fetch_page(client: &Client, url: &str) -> Result<String, ScreenerError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Pull the status text out of the company summary table: fourth row,
/// second cell of `#tabela_resumo_empresa`.
pub fn extract_status(html: &str) -> Option<String> {
    let row_sel = Selector::parse("#tabela_resumo_empresa tbody tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let document = Html::parse_document(html);
    let row = document.select(&row_sel).nth(3)?;
    let cell = row.select(&cell_sel).nth(1)?;
    Some(cell.text().collect::<String>().trim().to_string())
}

/// Split `len` candidates into `workers` contiguous near-equal chunks.
///
/// The first `len % workers` chunks take one extra candidate, so the last
/// chunk absorbs any shortfall. Boundaries are validated to be
/// non-overlapping and to cover `0..len` exactly once.
pub fn partition(len: usize, workers: usize) -> Result<Vec<(usize, usize)>, ScreenerError> {
    if workers == 0 {
        return Err(ScreenerError::InvalidPartition(
            "worker count must be positive".to_string(),
        ));
    }

    let base = len / workers;
    let remainder = len % workers;

    let mut chunks = Vec::with_capacity(workers);
    let mut start: i64 = 0;

    for worker in 0..workers {
        let size = if worker < remainder { base + 1 } else { base };
        let end = start + size as i64;
        chunks.push(checked_chunk(start, end, len)?);
        start = end;
    }

    if start != len as i64 {
        return Err(ScreenerError::InvalidPartition(format!(
            "chunks cover {} of {} candidates",
            start, len
        )));
    }

    Ok(chunks)
}

/// Validate one chunk boundary pair against the candidate list length.
pub fn checked_chunk(start: i64, end: i64, len: usize) -> Result<(usize, usize), ScreenerError> {
    if start < 0 || end < 0 || start > end || end > len as i64 {
        return Err(ScreenerError::InvalidPartition(format!(
            "bounds {}..{} out of range for {} candidates",
            start, end, len
        )));
    }
    Ok((start as usize, end as usize))
}
