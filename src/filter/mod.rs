//! Financial Filter Engine.
//!
//! Reduces the normalized record set to the twenty best candidates by
//! assessed value. The four local stages are ordered and stateful: each one
//! consumes the set, re-sorts it as a side effect, and returns it. Stage
//! five hands the survivors to the bankruptcy verifier and removes whatever
//! it flags.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use crate::bankruptcy::BankruptcyVerifier;
use crate::error::ScreenerError;
use crate::models::{issuer_root, RecordSet};

/// At most this many stage-3 leaders enter issuer deduplication.
const DEDUP_CANDIDATES: usize = 40;

/// Size of the final shortlist.
const SHORTLIST_SIZE: usize = 20;

/// Stage 1: liquidity floor.
///
/// Sorts ascending by financial volume and removes every record below
/// `min_volume`. A negative threshold is operator misconfiguration and is
/// rejected before anything else is looked at.
pub fn drop_low_volume(mut set: RecordSet, min_volume: i64) -> Result<RecordSet, ScreenerError> {
    if min_volume < 0 {
        return Err(ScreenerError::InvalidThreshold(min_volume));
    }
    if set.is_empty() {
        return Err(ScreenerError::EmptyDataset("liquidity floor"));
    }

    set.sort_by_key(|r| r.financial_volume);
    set.retain(|r| r.financial_volume >= min_volume);
    Ok(set)
}

/// Stage 2: profitability floor.
///
/// Sorts ascending by EBIT margin and removes strictly negative margins;
/// zero margin is retained.
pub fn drop_non_positive_margin(mut set: RecordSet) -> Result<RecordSet, ScreenerError> {
    if set.is_empty() {
        return Err(ScreenerError::EmptyDataset("profitability floor"));
    }

    set.sort_by(|a, b| total_cmp(a.ebit_margin_pct, b.ebit_margin_pct));
    set.retain(|r| r.ebit_margin_pct >= 0.0);
    Ok(set)
}

/// Stage 3: valuation ranking.
///
/// Stable ascending sort by EV/EBIT, cheapest first. This ordering is the
/// ranking the rest of the pipeline and the final report rely on.
pub fn sort_by_ev_ebit(mut set: RecordSet) -> Result<RecordSet, ScreenerError> {
    if set.is_empty() {
        return Err(ScreenerError::EmptyDataset("valuation ranking"));
    }

    set.sort_by(|a, b| total_cmp(a.ev_ebit, b.ev_ebit));
    Ok(set)
}

/// Stage 4: issuer deduplication.
///
/// Keeps at most the first [`DEDUP_CANDIDATES`] stage-3 leaders, then for
/// every issuer root present more than once retains only the member with
/// the largest financial volume. On equal volume the member encountered
/// first in stage-3 order wins. Output keeps stage-3 relative order.
pub fn drop_duplicate_issuers(mut set: RecordSet) -> Result<RecordSet, ScreenerError> {
    if set.is_empty() {
        return Err(ScreenerError::EmptyDataset("issuer deduplication"));
    }

    set.truncate(DEDUP_CANDIDATES);

    // Index of the largest-volume member per issuer root. Strict comparison
    // keeps the earliest-ranked member on ties.
    let mut best_by_root: HashMap<String, usize> = HashMap::new();
    let mut members_by_root: HashMap<String, usize> = HashMap::new();

    for (idx, record) in set.iter().enumerate() {
        let root = issuer_root(&record.stock).to_string();
        *members_by_root.entry(root.clone()).or_insert(0) += 1;

        let improves = match best_by_root.get(&root) {
            Some(&best) => set[best].financial_volume < record.financial_volume,
            None => true,
        };
        if improves {
            best_by_root.insert(root, idx);
        }
    }

    let survivors = set
        .into_iter()
        .enumerate()
        .filter(|(idx, record)| {
            let root = issuer_root(&record.stock);
            members_by_root[root] == 1 || best_by_root[root] == *idx
        })
        .map(|(_, record)| record)
        .collect();

    Ok(survivors)
}

/// Run the full filter sequence and the bankruptcy check, returning the
/// final shortlist in valuation-rank order.
pub async fn apply_financial_filters(
    set: RecordSet,
    verifier: &BankruptcyVerifier,
    min_volume: i64,
) -> Result<RecordSet> {
    if set.is_empty() {
        return Err(ScreenerError::EmptyDataset("financial filters").into());
    }

    info!("Applying financial filters to {} records", set.len());

    let set = drop_low_volume(set, min_volume)?;
    let set = drop_non_positive_margin(set)?;
    let set = sort_by_ev_ebit(set)?;
    let mut set = drop_duplicate_issuers(set)?;

    let tickers: Vec<String> = set.iter().map(|r| r.stock.clone()).collect();
    let flagged = verifier.verify(&tickers).await?;
    if !flagged.is_empty() {
        info!("Removing {} tickers flagged as non-operational", flagged.len());
        set.retain(|r| !flagged.contains(&r.stock));
    }

    set.truncate(SHORTLIST_SIZE);
    info!("Shortlist ready with {} records", set.len());
    Ok(set)
}

fn total_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
