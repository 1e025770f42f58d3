//! Raw-table normalization.
//!
//! Turns the second scraped table into typed [`StockRecord`]s: maps the
//! pt-BR column names, strips percent signs and thousands separators,
//! converts decimal commas, and coerces unparseable cells to zero.

use tracing::debug;

use crate::error::ScreenerError;
use crate::models::{RecordSet, StockRecord};
use crate::scraper::RawTable;

const STOCK_COL: &str = "Ação";
const PRICE_COL: &str = "Preço";
const EBIT_MARGIN_COL: &str = "Margem EBIT";
const EV_EBIT_COL: &str = "EV/EBIT";
const DIV_YIELD_COL: &str = "Div.Yield";
const FINANCIAL_VOLUME_COL: &str = "Volume Financ.(R$)";

/// Convert the scraped table list into a typed record set.
///
/// The indicators page puts the data in the second table; anything else is
/// navigation chrome. Fails with [`ScreenerError::EmptyInput`] when that
/// table is absent and with [`ScreenerError::MalformedRow`] when a required
/// column is missing from its header.
pub fn normalize(tables: &[RawTable]) -> Result<RecordSet, ScreenerError> {
    let table = tables.get(1).ok_or(ScreenerError::EmptyInput)?;
    if table.rows.is_empty() {
        return Err(ScreenerError::EmptyInput);
    }

    let stock_idx = column_index(table, STOCK_COL)?;
    let price_idx = column_index(table, PRICE_COL)?;
    let margin_idx = column_index(table, EBIT_MARGIN_COL)?;
    let ev_ebit_idx = column_index(table, EV_EBIT_COL)?;
    let yield_idx = column_index(table, DIV_YIELD_COL)?;
    let volume_idx = column_index(table, FINANCIAL_VOLUME_COL)?;

    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let stock = cell(row, stock_idx);
        if stock.is_empty() {
            continue;
        }

        // Rows with no margin or valuation figure carry nothing the filter
        // stages can rank on.
        let margin_cell = cell(row, margin_idx);
        let ev_ebit_cell = cell(row, ev_ebit_idx);
        if margin_cell.is_empty() || ev_ebit_cell.is_empty() {
            debug!("Dropping {}: blank EBIT margin or EV/EBIT", stock);
            continue;
        }

        records.push(StockRecord {
            stock: stock.to_string(),
            price: parse_decimal(cell(row, price_idx)),
            ebit_margin_pct: parse_decimal(margin_cell),
            ev_ebit: parse_decimal(ev_ebit_cell),
            dividend_yield_pct: parse_decimal(cell(row, yield_idx)),
            financial_volume: parse_decimal(cell(row, volume_idx)) as i64,
        });
    }

    Ok(records)
}

fn column_index(table: &RawTable, name: &str) -> Result<usize, ScreenerError> {
    table
        .headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ScreenerError::MalformedRow {
            column: name.to_string(),
        })
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("").trim()
}

/// Parse a pt-BR formatted number: trailing `%` stripped, `.` treated as a
/// thousands separator, `,` as the decimal point. Anything unparseable or
/// non-finite coerces to zero.
fn parse_decimal(raw: &str) -> f64 {
    let cleaned = raw
        .trim()
        .trim_end_matches('%')
        .replace('.', "")
        .replace(',', ".");

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
