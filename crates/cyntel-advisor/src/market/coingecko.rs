//! CoinGecko Market Data Client
//!
//! Live implementation of `MarketDataClient` over the CoinGecko v3 REST API.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::MarketDataClient;
use crate::error::{AdvisorError, Result};
use crate::model::{AssetQuote, DISPLAY_LIMIT, TrendingEntry};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko client configuration
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Optional demo API key
    pub api_key: Option<String>,

    /// Request timeout; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl CoinGeckoConfig {
    /// Read `COINGECKO_BASE_URL`, `COINGECKO_API_KEY` and `COINGECKO_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let base_url = std::env::var("COINGECKO_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let timeout_secs = std::env::var("COINGECKO_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok());

        Self {
            base_url,
            api_key,
            timeout_secs,
        }
    }
}

/// CoinGecko REST client
pub struct CoinGeckoClient {
    http: reqwest::Client,
    config: CoinGeckoConfig,
}

/// Row of `/coins/markets`
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<Decimal>,
    market_cap: Option<Decimal>,
    market_cap_rank: Option<u32>,
    total_volume: Option<Decimal>,
    high_24h: Option<Decimal>,
    low_24h: Option<Decimal>,
    price_change_percentage_24h: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingCoin>,
}

#[derive(Debug, Deserialize)]
struct TrendingCoin {
    item: TrendingItem,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    id: String,
    name: String,
    symbol: String,
    market_cap_rank: Option<u32>,
    #[serde(default)]
    data: Option<TrendingData>,
}

#[derive(Debug, Deserialize)]
struct TrendingData {
    #[serde(default, deserialize_with = "lenient_decimal")]
    price: Option<Decimal>,
    #[serde(default)]
    price_change_percentage_24h: Option<HashMap<String, Option<Decimal>>>,
}

/// Accepts `0.0123`, `"0.0123"` and `"$1,234.50"`
fn lenient_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64().and_then(|f| Decimal::from_str(&f.to_string()).ok()),
        serde_json::Value::String(s) => {
            let cleaned = s.replace(['$', ','], "");
            Decimal::from_str(cleaned.trim())
                .or_else(|_| Decimal::from_scientific(cleaned.trim()))
                .ok()
        }
        _ => None,
    }))
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_lowercase()
}

impl MarketRow {
    fn into_quote(self) -> Result<AssetQuote> {
        let price = self.current_price.ok_or_else(|| {
            AdvisorError::Provider(format!("no price reported for {}", self.id))
        })?;

        let mut quote = AssetQuote::new(self.id, self.symbol, self.name, price);
        quote.change_24h_pct = self.price_change_percentage_24h;
        quote.market_cap_usd = self.market_cap;
        quote.volume_24h_usd = self.total_volume;
        quote.rank = self.market_cap_rank;
        quote.high_24h_usd = self.high_24h;
        quote.low_24h_usd = self.low_24h;
        Ok(quote)
    }
}

impl TrendingItem {
    fn into_entry(self) -> TrendingEntry {
        let quote = self.data.and_then(|data| {
            let price = data.price?;
            let mut quote = AssetQuote::new(&self.id, &self.symbol, &self.name, price);
            quote.change_24h_pct = data
                .price_change_percentage_24h
                .as_ref()
                .and_then(|changes| changes.get("usd").copied().flatten());
            quote.rank = self.market_cap_rank;
            Some(quote)
        });

        TrendingEntry {
            symbol: self.symbol.to_uppercase(),
            id: self.id,
            name: self.name,
            rank: self.market_cap_rank,
            quote,
        }
    }
}

fn quote_for(rows: Vec<MarketRow>, ticker: &str) -> Result<AssetQuote> {
    rows.into_iter()
        .find(|row| row.id == ticker)
        .ok_or_else(|| AdvisorError::NotFound(ticker.to_string()))?
        .into_quote()
}

fn price_for(prices: &HashMap<String, SimplePrice>, ticker: &str) -> Result<Decimal> {
    prices
        .get(ticker)
        .and_then(|p| p.usd)
        .ok_or_else(|| AdvisorError::NotFound(ticker.to_string()))
}

fn trending_entries(response: TrendingResponse) -> Vec<TrendingEntry> {
    response
        .coins
        .into_iter()
        .take(DISPLAY_LIMIT)
        .map(|coin| coin.item.into_entry())
        .collect()
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("cyntel/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AdvisorError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CoinGeckoConfig::from_env())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut request = self.http
            .get(format!("{}{}", self.config.base_url, path))
            .query(query)
            .header(ACCEPT, "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, path, "CoinGecko request failed");
            return Err(AdvisorError::Provider(format!("CoinGecko returned {status}")));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn markets(&self, ids: &str) -> Result<Vec<MarketRow>> {
        self.get_json(
            "/coins/markets",
            &[
                ("vs_currency", "usd"),
                ("ids", ids),
                ("price_change_percentage", "24h"),
            ],
        )
        .await
    }
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    async fn get_quote(&self, ticker: &str) -> Result<AssetQuote> {
        let ticker = normalize_ticker(ticker);
        let rows = self.markets(&ticker).await?;
        quote_for(rows, &ticker)
    }

    async fn get_simple_price(&self, ticker: &str) -> Result<Decimal> {
        let ticker = normalize_ticker(ticker);
        let prices: HashMap<String, SimplePrice> = self
            .get_json("/simple/price", &[("ids", ticker.as_str()), ("vs_currencies", "usd")])
            .await?;
        price_for(&prices, &ticker)
    }

    async fn get_trending(&self) -> Result<Vec<TrendingEntry>> {
        let response: TrendingResponse = self.get_json("/search/trending", &[]).await?;
        Ok(trending_entries(response))
    }

    /// One `/coins/markets` call for the whole batch
    async fn get_quotes(&self, tickers: &[String]) -> Vec<Result<AssetQuote>> {
        let tickers: Vec<String> = tickers.iter().map(|t| normalize_ticker(t)).collect();

        match self.markets(&tickers.join(",")).await {
            Ok(rows) => {
                let mut by_id: HashMap<String, MarketRow> =
                    rows.into_iter().map(|row| (row.id.clone(), row)).collect();
                tickers
                    .iter()
                    .map(|t| {
                        by_id
                            .remove(t)
                            .ok_or_else(|| AdvisorError::NotFound(t.clone()))
                            .and_then(MarketRow::into_quote)
                    })
                    .collect()
            }
            Err(e) => {
                let reason = e.to_string();
                tickers
                    .iter()
                    .map(|_| Err(AdvisorError::Provider(reason.clone())))
                    .collect()
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.get_json::<serde_json::Value>("/ping", &[]).await.is_ok()
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
