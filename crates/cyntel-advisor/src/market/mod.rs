//! Market Data Integration
//!
//! Abstraction over the market-data provider plus its implementations.

mod coingecko;
mod mock;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use mock::MockMarketData;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{AssetQuote, TrendingEntry};

/// Market-data client trait (Strategy pattern)
///
/// Tickers are matched case-insensitively. An unknown ticker is reported as
/// `AdvisorError::NotFound`, distinct from connectivity or provider failures.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Full quote for one asset
    async fn get_quote(&self, ticker: &str) -> Result<AssetQuote>;

    /// USD price only
    async fn get_simple_price(&self, ticker: &str) -> Result<Decimal>;

    /// Top trending assets, at most five, in provider order
    async fn get_trending(&self) -> Result<Vec<TrendingEntry>>;

    /// Quotes for several assets, one result per ticker in input order
    async fn get_quotes(&self, tickers: &[String]) -> Vec<Result<AssetQuote>> {
        let mut quotes = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            quotes.push(self.get_quote(ticker).await);
        }
        quotes
    }

    /// Check if the provider is reachable
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}
