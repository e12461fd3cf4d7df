//! Server Configuration
//!
//! Backend selection read from the environment. Provider-specific settings
//! (keys, URLs, timeouts) are read by each provider's own `from_env`.

use std::str::FromStr;

use anyhow::{Context, bail};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NarrativeBackend {
    OpenAi,
    Ollama,
}

impl NarrativeBackend {
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "llama3.2",
        }
    }
}

impl FromStr for NarrativeBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => bail!("unknown narrative provider '{other}' (expected openai or ollama)"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketBackend {
    CoinGecko,
    Mock,
}

impl FromStr for MarketBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coingecko" => Ok(Self::CoinGecko),
            "mock" => Ok(Self::Mock),
            other => bail!("unknown market provider '{other}' (expected coingecko or mock)"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceBackend {
    Moralis,
    Mock,
}

impl FromStr for BalanceBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moralis" => Ok(Self::Moralis),
            "mock" => Ok(Self::Mock),
            other => bail!("unknown balance provider '{other}' (expected moralis or mock)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub narrative: NarrativeBackend,
    pub narrative_model: String,
    pub market: MarketBackend,
    pub balances: BalanceBackend,
}

impl ServerConfig {
    /// Read `BIND_ADDR`, `NARRATIVE_PROVIDER`, `NARRATIVE_MODEL`,
    /// `MARKET_PROVIDER` and `BALANCE_PROVIDER`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let narrative: NarrativeBackend = var("NARRATIVE_PROVIDER")
            .map_or(Ok(NarrativeBackend::OpenAi), |v| v.parse())
            .context("invalid NARRATIVE_PROVIDER")?;
        let market: MarketBackend = var("MARKET_PROVIDER")
            .map_or(Ok(MarketBackend::CoinGecko), |v| v.parse())
            .context("invalid MARKET_PROVIDER")?;
        let balances: BalanceBackend = var("BALANCE_PROVIDER")
            .map_or(Ok(BalanceBackend::Moralis), |v| v.parse())
            .context("invalid BALANCE_PROVIDER")?;

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            narrative_model: var("NARRATIVE_MODEL")
                .unwrap_or_else(|| narrative.default_model().into()),
            narrative,
            market,
            balances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.narrative, NarrativeBackend::OpenAi);
        assert_eq!(config.narrative_model, "gpt-4o-mini");
        assert_eq!(config.market, MarketBackend::CoinGecko);
        assert_eq!(config.balances, BalanceBackend::Moralis);
    }

    #[test]
    fn test_ollama_gets_its_own_default_model() {
        let config = config(&[("NARRATIVE_PROVIDER", "Ollama"), ("MARKET_PROVIDER", "mock")]).unwrap();
        assert_eq!(config.narrative, NarrativeBackend::Ollama);
        assert_eq!(config.narrative_model, "llama3.2");
        assert_eq!(config.market, MarketBackend::Mock);
    }

    #[test]
    fn test_explicit_model_and_blank_values() {
        let config = config(&[("NARRATIVE_MODEL", "gpt-4o"), ("BIND_ADDR", "  ")]).unwrap();
        assert_eq!(config.narrative_model, "gpt-4o");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = config(&[("BALANCE_PROVIDER", "etherscan")]).unwrap_err();
        assert!(err.to_string().contains("BALANCE_PROVIDER"));
    }
}
