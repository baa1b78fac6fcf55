//! Yahoo Finance chart API adapter with a TTL quote cache.
//!
//! Quote fetches are best-effort: per-symbol failures drop that symbol from
//! the batch and history failures yield an empty series, matching the port
//! contract. Cached quotes are served for `cache_ttl_secs` so a dashboard
//! refresh does not re-hit the upstream for every symbol.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::error::FoliotrackError;
use crate::domain::quote::{OhlcvBar, Quote};
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_CACHE_TTL_SECS: i64 = 300;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; foliotrack/0.1)";

pub struct YahooQuoteAdapter {
    client: Client,
    base_url: String,
    quote_cache: Cache<String, Quote>,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: Meta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Meta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Default)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

impl YahooQuoteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FoliotrackError> {
        let base_url = config
            .get_string("quotes", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let ttl = config.get_int("quotes", "cache_ttl_secs", DEFAULT_CACHE_TTL_SECS);
        Self::new(base_url, ttl.max(0) as u64)
    }

    pub fn new(base_url: String, cache_ttl_secs: u64) -> Result<Self, FoliotrackError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FoliotrackError::QuoteProvider {
                reason: e.to_string(),
            })?;

        let quote_cache = Cache::builder()
            .max_capacity(1024)
            .time_to_live(Duration::from_secs(cache_ttl_secs.max(1)))
            .build();

        Ok(Self {
            client,
            base_url,
            quote_cache,
        })
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Option<ChartResult> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, symbol, range, interval
        );
        let response = self.client.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let envelope: ChartEnvelope = response.json().await.ok()?;
        envelope.chart.result?.into_iter().next()
    }
}

fn parse_quote(result: &ChartResult) -> Option<Quote> {
    let price = result.meta.regular_market_price?;
    if !price.is_finite() {
        return None;
    }
    // An absent or zero previous close reads as "no day change available".
    let prev_close = result
        .meta
        .chart_previous_close
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(0.0);
    Some(Quote { price, prev_close })
}

fn parse_history(result: &ChartResult) -> Vec<OhlcvBar> {
    let timestamps = match &result.timestamp {
        Some(ts) => ts,
        None => return Vec::new(),
    };
    let block = match result.indicators.quote.first() {
        Some(b) => b,
        None => return Vec::new(),
    };

    let series = |field: &Option<Vec<Option<f64>>>, i: usize| -> Option<f64> {
        field.as_ref()?.get(i).copied().flatten()
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = match DateTime::from_timestamp(ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        // Yahoo pads gaps with nulls; a bar missing any OHLC value is dropped.
        let (open, high, low, close) = match (
            series(&block.open, i),
            series(&block.high, i),
            series(&block.low, i),
            series(&block.close, i),
        ) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => continue,
        };
        let volume = block
            .volume
            .as_ref()
            .and_then(|v| v.get(i).copied().flatten())
            .unwrap_or(0);
        bars.push(OhlcvBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    bars
}

#[async_trait]
impl QuotePort for YahooQuoteAdapter {
    async fn batch_quote(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let mut quotes = HashMap::new();
        for symbol in symbols {
            if let Some(cached) = self.quote_cache.get(symbol) {
                quotes.insert(symbol.clone(), cached);
                continue;
            }
            let fetched = self
                .fetch_chart(symbol, "1d", "1d")
                .await
                .as_ref()
                .and_then(parse_quote);
            if let Some(quote) = fetched {
                self.quote_cache.insert(symbol.clone(), quote);
                quotes.insert(symbol.clone(), quote);
            }
        }
        quotes
    }

    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Vec<OhlcvBar> {
        match self.fetch_chart(symbol, period, interval).await {
            Some(result) => {
                let mut bars = parse_history(&result);
                bars.sort_by_key(|b| b.date);
                bars
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn chart_fixture(json: &str) -> ChartResult {
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();
        envelope.chart.result.unwrap().into_iter().next().unwrap()
    }

    const QUOTE_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": 189.25,
                    "chartPreviousClose": 187.10
                },
                "timestamp": null,
                "indicators": { "quote": [{}] }
            }]
        }
    }"#;

    const HISTORY_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "regularMarketPrice": 12.0, "chartPreviousClose": 11.5 },
                "timestamp": [1704153600, 1704240000, 1704326400],
                "indicators": {
                    "quote": [{
                        "open":   [10.0, 11.0, null],
                        "high":   [10.5, 11.5, 12.5],
                        "low":    [9.5, 10.5, 11.5],
                        "close":  [10.2, 11.2, 12.2],
                        "volume": [1000, null, 3000]
                    }]
                }
            }]
        }
    }"#;

    #[test]
    fn parse_quote_reads_price_and_prev_close() {
        let result = chart_fixture(QUOTE_JSON);
        let quote = parse_quote(&result).unwrap();
        assert!((quote.price - 189.25).abs() < 1e-9);
        assert!((quote.prev_close - 187.10).abs() < 1e-9);
    }

    #[test]
    fn parse_quote_without_price_is_none() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": null, "chartPreviousClose": 10.0 },
                    "timestamp": null,
                    "indicators": { "quote": [{}] }
                }]
            }
        }"#;
        assert!(parse_quote(&chart_fixture(json)).is_none());
    }

    #[test]
    fn parse_quote_drops_non_positive_prev_close() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": 50.0, "chartPreviousClose": 0.0 },
                    "timestamp": null,
                    "indicators": { "quote": [{}] }
                }]
            }
        }"#;
        let quote = parse_quote(&chart_fixture(json)).unwrap();
        assert!((quote.prev_close - 0.0).abs() < f64::EPSILON);
        assert!((quote.change_pct() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_history_builds_bars_and_skips_null_rows() {
        let result = chart_fixture(HISTORY_JSON);
        let bars = parse_history(&result);

        // Third row has a null open and is dropped.
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!((bars[0].open - 10.0).abs() < 1e-9);
        assert!((bars[0].close - 10.2).abs() < 1e-9);
        assert_eq!(bars[0].volume, 1000);
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn parse_history_without_timestamps_is_empty() {
        let result = chart_fixture(QUOTE_JSON);
        assert!(parse_history(&result).is_empty());
    }

    #[tokio::test]
    async fn batch_quote_serves_cached_entries_without_network() {
        // Unroutable base URL, so any hit past the cache returns nothing.
        let adapter = YahooQuoteAdapter::new("http://127.0.0.1:1".into(), 300).unwrap();
        let quote = Quote {
            price: 42.0,
            prev_close: 41.0,
        };
        adapter.quote_cache.insert("AAPL".to_string(), quote);

        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        let quotes = adapter.batch_quote(&symbols).await;

        assert_eq!(quotes.len(), 1);
        assert!((quotes["AAPL"].price - 42.0).abs() < 1e-9);
        assert!(!quotes.contains_key("MSFT"));
    }

    #[tokio::test]
    async fn history_on_unreachable_source_is_empty() {
        let adapter = YahooQuoteAdapter::new("http://127.0.0.1:1".into(), 300).unwrap();
        let bars = adapter.history("AAPL", "6mo", "1d").await;
        assert!(bars.is_empty());
    }

    #[test]
    fn from_config_without_quote_keys_uses_defaults() {
        struct EmptyConfig;
        impl ConfigPort for EmptyConfig {
            fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
                None
            }
            fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
                default
            }
            fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
                default
            }
            fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
                default
            }
        }

        let adapter = YahooQuoteAdapter::from_config(&EmptyConfig).unwrap();
        assert_eq!(adapter.base_url, DEFAULT_BASE_URL);
    }
}
