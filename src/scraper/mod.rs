//! Indicators-page acquisition.
//!
//! Fetches the multi-table indicator listing for all B3 tickers and breaks
//! it into raw string tables. The endpoint embeds a reference date in the
//! URL and only serves data up to the previous day, so the embedded date is
//! rolled back before every fetch.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::models::Config;

/// Indicator listing endpoint with the reference date embedded (URL-encoded
/// inside the `dt_arr` parameter).
const INDICATORS_URL: &str = "https://www.investsite.com.br/selecao_acoes.php?dt_arr=%255B%252220230907%2522%252C%2522atual%2522%255D&ROTanC_min=&ROTanC_max=&ROInvC_min=&ROInvC_max=&chk_lst%5B%5D=itm8&ROE_min=&ROE_max=&ROA_min=&ROA_max=&margem_liquida_min=&margem_liquida_max=&margem_bruta_min=&margem_bruta_max=&margem_EBIT_min=&margem_EBIT_max=&chk_lst%5B%5D=itm13&giro_ativo_min=&giro_ativo_max=&fin_leverage_min=&fin_leverage_max=&debt_equity_min=&debt_equity_max=&p_e_min=&p_e_max=&p_bv_min=&p_bv_max=&p_receita_liquida_min=&p_receita_liquida_max=&p_FCO_min=&p_FCO_max=&p_FCF1_min=&p_FCF1_max=&p_EBIT_min=&p_EBIT_max=&p_ncav_min=&p_ncav_max=&p_ativo_total_min=&p_ativo_total_max=&p_capital_giro_min=&p_capital_giro_max=&EV_EBIT_min=&EV_EBIT_max=&chk_lst%5B%5D=itm26&EV_EBITDA_min=&EV_EBITDA_max=&EV_receita_liquida_min=&EV_receita_liquida_max=&EV_FCO_min=&EV_FCO_max=&EV_FCF1_min=&EV_FCF1_max=&EV_ativo_total_min=&EV_ativo_total_max=&div_yield_min=&div_yield_max=&chk_lst%5B%5D=itm32&vol_financ_min=&vol_financ_max=&chk_lst%5B%5D=itm33&market_cap_min=&market_cap_max=&setor=";

/// Placeholder date baked into [`INDICATORS_URL`].
const URL_DATE_PLACEHOLDER: &str = "20230907";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/50.0.2661.75 Safari/537.36";

/// One `<table>` element broken into strings: header cells plus one string
/// vector per body row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// HTTP client for the indicator listing endpoint.
pub struct IndicatorsClient {
    client: Client,
    base_url: String,
    use_cached_dataset: bool,
    cache_path: PathBuf,
}

impl IndicatorsClient {
    /// Create a new indicators client
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: INDICATORS_URL.to_string(),
            use_cached_dataset: config.use_cached_dataset,
            cache_path: PathBuf::from(&config.cache_path),
        })
    }

    /// Point the client at a different listing endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the indicator listing for `today` and break every `<table>`
    /// element into a [`RawTable`].
    ///
    /// With `use_cached_dataset` set, the raw page body is read from the
    /// local cache file instead of the network. A successful network fetch
    /// refreshes the cache for later cached runs.
    pub async fn fetch_raw_tables(&self, today: NaiveDate) -> Result<Vec<RawTable>> {
        let body = if self.use_cached_dataset {
            info!("Reading cached indicators page from {:?}", self.cache_path);
            fs::read_to_string(&self.cache_path).with_context(|| {
                format!(
                    "cached dataset requested but {:?} could not be read",
                    self.cache_path
                )
            })?
        } else {
            let url = self.refreshed_url(today);
            info!("Fetching indicators table");
            debug!("GET {}", url);
            let response = self.client.get(&url).send().await?.error_for_status()?;
            let body = response.text().await?;

            if let Err(e) = fs::write(&self.cache_path, &body) {
                debug!("Could not refresh indicators cache: {}", e);
            }
            body
        };

        let tables = parse_tables(&body);
        info!("Extracted {} tables from the indicators page", tables.len());
        Ok(tables)
    }

    /// Listing URL with the embedded date rolled back for `today`.
    fn refreshed_url(&self, today: NaiveDate) -> String {
        let reference = reference_date(today);
        self.base_url.replace(
            URL_DATE_PLACEHOLDER,
            &reference.format("%Y%m%d").to_string(),
        )
    }
}

/// The endpoint only has data up to the day before the run date. On the
/// first day of a month this lands on the last day of the previous month.
pub fn reference_date(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// Break every `<table>` element in the page into header and row strings.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    // Static selectors only fail on invalid CSS, which cannot happen here.
    let table_sel = Selector::parse("table").unwrap();
    let header_sel = Selector::parse("th").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let document = Html::parse_document(html);
    let mut tables = Vec::new();

    for table in document.select(&table_sel) {
        let headers: Vec<String> = table
            .select(&header_sel)
            .map(|th| th.text().collect::<String>().trim().to_string())
            .collect();

        let rows: Vec<Vec<String>> = table
            .select(&row_sel)
            .map(|tr| {
                tr.select(&cell_sel)
                    .map(|td| td.text().collect::<String>().trim().to_string())
                    .collect::<Vec<String>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        tables.push(RawTable { headers, rows });
    }

    tables
}
