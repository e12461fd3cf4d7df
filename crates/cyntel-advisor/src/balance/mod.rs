//! Wallet Balance Integration
//!
//! Abstraction over the on-chain balance provider plus its implementations.

mod mock;
mod moralis;

pub use mock::{DEMO_WALLET, MockBalanceClient};
pub use moralis::{MoralisClient, MoralisConfig};

use async_trait::async_trait;

use crate::error::{AdvisorError, Result};
use crate::model::TokenBalance;

/// Balance client trait (Strategy pattern)
#[async_trait]
pub trait BalanceClient: Send + Sync {
    /// Every fungible-token balance the wallet holds on `chain`, zero balances included
    async fn get_wallet_balances(&self, address: &str, chain: &str) -> Result<Vec<TokenBalance>>;

    /// Provider name
    fn name(&self) -> &str;
}

/// `0x` followed by 40 hex digits
pub fn validate_address(address: &str) -> Result<()> {
    let valid = address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));

    if valid {
        Ok(())
    } else {
        Err(AdvisorError::Provider(format!("malformed wallet address: {address}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x1234567890abcdef1234567890ABCDEF12345678").is_ok());
        assert!(validate_address("1234567890abcdef1234567890abcdef12345678").is_err());
        assert!(validate_address("0x1234").is_err());
        assert!(validate_address("0xzz34567890abcdef1234567890abcdef12345678").is_err());
    }
}
