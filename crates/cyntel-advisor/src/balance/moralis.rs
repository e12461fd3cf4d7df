//! Moralis Balance Client
//!
//! Reads ERC-20 balances through the Moralis EVM API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::{BalanceClient, validate_address};
use crate::error::{AdvisorError, Result};
use crate::model::TokenBalance;

const DEFAULT_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";
const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone, Debug)]
pub struct MoralisConfig {
    pub base_url: String,

    /// Required for live lookups; absence only fails portfolio requests
    pub api_key: Option<String>,

    pub timeout_secs: Option<u64>,
}

impl Default for MoralisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl MoralisConfig {
    /// Read `MORALIS_BASE_URL`, `MORALIS_API_KEY` and `MORALIS_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let api_key = std::env::var("MORALIS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("MORALIS_API_KEY not set, portfolio lookups will fail");
        }

        Self {
            base_url: std::env::var("MORALIS_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            api_key,
            timeout_secs: std::env::var("MORALIS_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok()),
        }
    }
}

pub struct MoralisClient {
    http: reqwest::Client,
    config: MoralisConfig,
}

/// Entry of `/{address}/erc20`
#[derive(Debug, Deserialize)]
struct Erc20Balance {
    symbol: Option<String>,
    name: Option<String>,
    decimals: Option<Decimals>,
    balance: String,
}

/// Moralis reports decimals as a number on some endpoints and a string on others
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Decimals {
    Number(u32),
    Text(String),
}

impl Decimals {
    fn value(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl Erc20Balance {
    fn into_balance(self, chain: &str) -> Result<TokenBalance> {
        let symbol = self
            .symbol
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AdvisorError::Provider("token without symbol".into()))?;
        let raw_amount: u128 = self.balance.trim().parse().map_err(|_| {
            AdvisorError::Provider(format!("unparseable balance for {symbol}: {}", self.balance))
        })?;
        let decimals = self
            .decimals
            .as_ref()
            .and_then(Decimals::value)
            .ok_or_else(|| AdvisorError::Provider(format!("no decimals for {symbol}")))?;

        let mut balance = TokenBalance::new(symbol, raw_amount, decimals);
        balance.name = self.name;
        balance.chain = chain.to_string();
        Ok(balance)
    }
}

/// Convert a response body, skipping entries that cannot be interpreted
fn parse_balances(body: &str, chain: &str) -> Result<Vec<TokenBalance>> {
    let entries: Vec<Erc20Balance> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry.into_balance(chain) {
            Ok(balance) => Some(balance),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping token balance");
                None
            }
        })
        .collect())
}

impl MoralisClient {
    pub fn new(config: MoralisConfig) -> Result<Self> {
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
        Self::new(MoralisConfig::from_env())
    }
}

#[async_trait]
impl BalanceClient for MoralisClient {
    async fn get_wallet_balances(&self, address: &str, chain: &str) -> Result<Vec<TokenBalance>> {
        validate_address(address)?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AdvisorError::Provider("MORALIS_API_KEY is not configured".into()))?;

        let response = self
            .http
            .get(format!("{}/{address}/erc20", self.config.base_url))
            .query(&[("chain", chain)])
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "Moralis request failed");
            return Err(AdvisorError::Provider(format!("Moralis returned {status}")));
        }

        parse_balances(&response.text().await?, chain)
    }

    fn name(&self) -> &str {
        "Moralis"
    }
}
