//! Mock Market Data Client
//!
//! For tests and demo mode. Returns realistic static quotes and records every
//! lookup it receives.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use super::MarketDataClient;
use crate::error::{AdvisorError, Result};
use crate::model::{AssetQuote, DISPLAY_LIMIT, TrendingEntry};

/// Mock market-data client with static quotes
pub struct MockMarketData {
    quotes: HashMap<String, AssetQuote>,
    trending: Vec<String>,
    failing: HashSet<String>,
    offline: bool,
    calls: Mutex<Vec<String>>,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    /// Client preloaded with a static table of major assets
    pub fn new() -> Self {
        let mut mock = Self::empty();
        // (id, symbol, name, price, 24h change, market cap, volume, rank)
        let table = [
            ("bitcoin", "btc", "Bitcoin", dec!(97500), dec!(2.5), dec!(1930000000000), dec!(25000000000), 1),
            ("ethereum", "eth", "Ethereum", dec!(3450), dec!(1.8), dec!(415000000000), dec!(15000000000), 2),
            ("solana", "sol", "Solana", dec!(195), dec!(4.2), dec!(93000000000), dec!(3000000000), 5),
            ("usd-coin", "usdc", "USDC", dec!(1.00), dec!(0.01), dec!(44000000000), dec!(6000000000), 7),
            ("cardano", "ada", "Cardano", dec!(0.95), dec!(-1.2), dec!(33000000000), dec!(900000000), 9),
            ("dogecoin", "doge", "Dogecoin", dec!(0.38), dec!(12.0), dec!(56000000000), dec!(4100000000), 8),
            ("chainlink", "link", "Chainlink", dec!(24.50), dec!(3.1), dec!(15400000000), dec!(700000000), 12),
            ("polkadot", "dot", "Polkadot", dec!(7.20), dec!(0.8), dec!(10900000000), dec!(300000000), 16),
            ("shiba-inu", "shib", "Shiba Inu", dec!(0.000022), dec!(-8.0), dec!(13000000000), dec!(800000000), 14),
            ("degen-base", "degen", "Degen", dec!(0.0125), dec!(0), dec!(160000000), dec!(25000000), 310),
        ];

        for (id, symbol, name, price, change, cap, volume, rank) in table {
            let mut quote = AssetQuote::new(id, symbol, name, price);
            quote.change_24h_pct = Some(change);
            quote.market_cap_usd = Some(cap);
            quote.volume_24h_usd = Some(volume);
            quote.rank = Some(rank);
            quote.high_24h_usd = Some(price * dec!(1.03));
            quote.low_24h_usd = Some(price * dec!(0.96));
            mock = mock.with_quote(quote);
        }

        mock.with_trending(&["solana", "dogecoin", "degen-base", "chainlink", "shiba-inu", "cardano"])
    }

    /// Client with no known assets
    pub fn empty() -> Self {
        Self {
            quotes: HashMap::new(),
            trending: Vec::new(),
            failing: HashSet::new(),
            offline: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add or replace a quote
    #[must_use]
    pub fn with_quote(mut self, quote: AssetQuote) -> Self {
        self.quotes.insert(quote.id.clone(), quote);
        self
    }

    /// Set the trending identifiers, in provider order
    #[must_use]
    pub fn with_trending(mut self, ids: &[&str]) -> Self {
        self.trending = ids.iter().map(|id| (*id).to_string()).collect();
        self
    }

    /// Every lookup for this ticker fails with a provider error
    #[must_use]
    pub fn with_failing_ticker(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_lowercase());
        self
    }

    /// Every call fails with a provider error
    #[must_use]
    pub const fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Lookups received so far, as `method:ticker`
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, method: &str, ticker: &str) {
        self.calls.lock().await.push(format!("{method}:{ticker}"));
    }

    /// Resolve a ticker by provider id first, then by symbol
    fn lookup(&self, ticker: &str) -> Result<&AssetQuote> {
        let ticker = ticker.trim().to_lowercase();
        if self.offline || self.failing.contains(&ticker) {
            return Err(AdvisorError::Provider(format!("mock failure for {ticker}")));
        }

        self.quotes
            .get(&ticker)
            .or_else(|| self.quotes.values().find(|q| q.symbol.eq_ignore_ascii_case(&ticker)))
            .ok_or(AdvisorError::NotFound(ticker))
    }
}

#[async_trait]
impl MarketDataClient for MockMarketData {
    async fn get_quote(&self, ticker: &str) -> Result<AssetQuote> {
        self.record("quote", ticker).await;
        self.lookup(ticker).cloned()
    }

    async fn get_simple_price(&self, ticker: &str) -> Result<Decimal> {
        self.record("price", ticker).await;
        self.lookup(ticker).map(|q| q.price_usd)
    }

    async fn get_trending(&self) -> Result<Vec<TrendingEntry>> {
        self.record("trending", "").await;
        if self.offline {
            return Err(AdvisorError::Provider("mock offline".into()));
        }

        Ok(self
            .trending
            .iter()
            .take(DISPLAY_LIMIT)
            .map(|id| {
                let quote = self.quotes.get(id);
                TrendingEntry {
                    id: id.clone(),
                    symbol: quote.map_or_else(|| id.to_uppercase(), |q| q.symbol.clone()),
                    name: quote.map_or_else(|| id.clone(), |q| q.name.clone()),
                    rank: quote.and_then(|q| q.rank),
                    quote: None,
                }
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        !self.offline // Mock is healthy unless told otherwise
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_quote() {
        let market = MockMarketData::new();

        let btc = market.get_quote("Bitcoin").await.unwrap();
        assert_eq!(btc.symbol, "BTC");
        assert!(btc.price_usd > Decimal::ZERO);
        assert_eq!(btc.rank, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_not_found() {
        let market = MockMarketData::new();
        let err = market.get_quote("notreal").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failing_ticker_is_provider_error() {
        let market = MockMarketData::new().with_failing_ticker("ethereum");
        let err = market.get_simple_price("ethereum").await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_simple_price_by_symbol() {
        let market = MockMarketData::new();
        assert_eq!(market.get_simple_price("usdc").await.unwrap(), dec!(1.00));
        assert_eq!(market.calls().await, vec!["price:usdc"]);
    }

    #[tokio::test]
    async fn test_trending_capped() {
        let market = MockMarketData::new();
        let trending = market.get_trending().await.unwrap();
        assert_eq!(trending.len(), 5);
        assert_eq!(trending[0].id, "solana");
        assert!(trending.iter().all(|e| e.quote.is_none()));
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let market = MockMarketData::new().with_failing_ticker("cardano");
        let tickers = vec!["solana".to_string(), "cardano".to_string(), "nope".to_string()];

        let quotes = market.get_quotes(&tickers).await;
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].as_ref().unwrap().id, "solana");
        assert!(!quotes[1].as_ref().unwrap_err().is_not_found());
        assert!(quotes[2].as_ref().unwrap_err().is_not_found());
    }
}
