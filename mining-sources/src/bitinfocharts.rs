//! BitInfoCharts page scraper
//!
//! Last-resort source. The coin pages are HTML, not an API: the stats table
//! has a label cell ("Difficulty", "Hashrate") followed by a value cell. Any
//! deviation from that layout is a parse failure rather than a guess.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use mining_core::{parse_hashrate, parse_number, CoinRecord, CoinSpec};

use crate::adapter::{get_body, host_of, SourceAdapter};
use crate::error::SourceError;

const BITINFOCHARTS_BASE: &str = "https://bitinfocharts.com";

pub const BITINFOCHARTS_LABEL: &str = "BitInfoCharts (scraped)";

/// HTML scraper for BitInfoCharts coin pages
#[derive(Clone)]
pub struct BitInfoChartsScraper {
    http: Client,
    base_url: String,
    host: String,
}

fn page_slug(coin_id: &str) -> Option<&'static str> {
    match coin_id {
        "BTC" => Some("bitcoin"),
        "BCH" => Some("bitcoin%20cash"),
        "XEC" => Some("ecash"),
        "LTC" => Some("litecoin"),
        "DOGE" => Some("dogecoin"),
        "BSV" => Some("bitcoin%20sv"),
        _ => None,
    }
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Value cell text following the first label cell containing `keyword`
fn value_after_label(document: &Html, keyword: &str) -> Option<String> {
    let row_selector = Selector::parse("tr").ok()?;
    let cell_selector = Selector::parse("td, th").ok()?;

    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        let label_idx = cells
            .iter()
            .position(|c| cell_text(c).to_lowercase().contains(keyword));
        if let Some(idx) = label_idx {
            return cells.get(idx + 1).map(cell_text);
        }
    }
    None
}

/// Strip trailing annotations like "(+1.2% 24h)" or "per second"
fn leading_value(text: &str) -> &str {
    text.split('(').next().unwrap_or(text).trim()
}

/// "126.27 T" -> 1.2627e14. Accepts a plain number or one magnitude suffix.
fn parse_scaled(text: &str) -> Option<f64> {
    let text = leading_value(text);
    if let Some(value) = parse_number(text) {
        return Some(value);
    }

    let trimmed = text.trim_end();
    let (last, _) = trimmed.char_indices().last()?;
    let (number, suffix) = trimmed.split_at(last);
    let multiplier = match suffix {
        "K" | "k" => 1e3,
        "M" => 1e6,
        "G" | "B" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => return None,
    };
    parse_number(number).map(|v| v * multiplier)
}

impl BitInfoChartsScraper {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, BITINFOCHARTS_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            host: host_of(&base_url),
            http,
            base_url,
        }
    }

    /// Extract difficulty and hashrate from a coin page
    pub fn parse_page(coin: &CoinSpec, html: &str) -> Result<CoinRecord, SourceError> {
        let document = Html::parse_document(html);

        let difficulty_text = value_after_label(&document, "difficulty")
            .ok_or(SourceError::MissingField("difficulty"))?;
        let difficulty = parse_scaled(&difficulty_text).ok_or_else(|| {
            SourceError::Parse(format!("Unrecognized difficulty value: {}", difficulty_text))
        })?;

        // Hashrate is optional, but if the row exists it has to parse
        let hashrate = match value_after_label(&document, "hashrate") {
            Some(text) => parse_hashrate(leading_value(&text)).ok_or_else(|| {
                SourceError::Parse(format!("Unrecognized hashrate value: {}", text))
            })?,
            None => 0.0,
        };

        Ok(CoinRecord::fetched(coin, difficulty, hashrate, BITINFOCHARTS_LABEL))
    }
}

#[async_trait]
impl SourceAdapter for BitInfoChartsScraper {
    fn name(&self) -> &str {
        "bitinfocharts"
    }

    fn label(&self) -> &str {
        BITINFOCHARTS_LABEL
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn supports(&self, coin: &CoinSpec) -> bool {
        page_slug(coin.id).is_some()
    }

    #[instrument(skip(self, coin), fields(coin = coin.id))]
    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
        let slug = page_slug(coin.id).ok_or_else(|| SourceError::Unsupported(coin.id.to_string()))?;

        let url = format!("{}/{}/", self.base_url, slug);
        debug!("[BitInfoCharts] Scraping {} page: {}", coin.id, url);

        let html = get_body(&self.http, &url).await?;
        let record = Self::parse_page(coin, &html)?;

        info!(
            "[BitInfoCharts] {}: difficulty={:.2e}, hashrate={:.4} EH/s",
            coin.id, record.difficulty, record.network_hashrate
        );
        Ok(record)
    }
}
