//! Mock Balance Client
//!
//! Static wallets for tests and demo mode.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{BalanceClient, validate_address};
use crate::error::{AdvisorError, Result};
use crate::model::TokenBalance;

/// Demo wallet served by `MockBalanceClient::new`
pub const DEMO_WALLET: &str = "0x1234567890abcdef1234567890abcdef12345678";

pub struct MockBalanceClient {
    wallets: HashMap<String, Vec<TokenBalance>>,
    offline: bool,
}

impl Default for MockBalanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBalanceClient {
    /// Client knowing a single demo wallet
    pub fn new() -> Self {
        Self::empty().with_wallet(
            DEMO_WALLET,
            vec![
                TokenBalance::new("ETH", 1_500_000_000_000_000_000, 18),
                TokenBalance::new("USDC", 2_500_000_000, 6),
                TokenBalance::new("DEGEN", 40_000_000_000_000_000_000_000, 18),
                TokenBalance::new("LINK", 0, 18),
                TokenBalance::new("UNKNOWNAI", 7_000_000_000_000_000_000, 18),
            ],
        )
    }

    pub fn empty() -> Self {
        Self {
            wallets: HashMap::new(),
            offline: false,
        }
    }

    /// Register balances for an address
    #[must_use]
    pub fn with_wallet(mut self, address: &str, balances: Vec<TokenBalance>) -> Self {
        self.wallets.insert(address.to_lowercase(), balances);
        self
    }

    /// Every call fails with a provider error
    #[must_use]
    pub const fn offline(mut self) -> Self {
        self.offline = true;
        self
    }
}

#[async_trait]
impl BalanceClient for MockBalanceClient {
    async fn get_wallet_balances(&self, address: &str, chain: &str) -> Result<Vec<TokenBalance>> {
        validate_address(address)?;
        if self.offline {
            return Err(AdvisorError::Provider("mock offline".into()));
        }

        // Unknown wallets are simply empty
        Ok(self
            .wallets
            .get(&address.to_lowercase())
            .map(|balances| {
                balances
                    .iter()
                    .filter(|b| b.chain == chain)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "MockBalanceClient"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SUPPORTED_CHAIN;

    #[tokio::test]
    async fn test_demo_wallet() {
        let client = MockBalanceClient::new();
        let balances = client
            .get_wallet_balances(&DEMO_WALLET.to_uppercase().replace("0X", "0x"), SUPPORTED_CHAIN)
            .await
            .unwrap();
        assert_eq!(balances.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_wallet_is_empty() {
        let client = MockBalanceClient::new();
        let balances = client
            .get_wallet_balances("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd", SUPPORTED_CHAIN)
            .await
            .unwrap();
        assert!(balances.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_address_rejected() {
        let client = MockBalanceClient::new();
        assert!(client.get_wallet_balances("vitalik.eth", SUPPORTED_CHAIN).await.is_err());
    }

    #[tokio::test]
    async fn test_offline() {
        let client = MockBalanceClient::new().offline();
        assert!(client.get_wallet_balances(DEMO_WALLET, SUPPORTED_CHAIN).await.is_err());
    }
}
