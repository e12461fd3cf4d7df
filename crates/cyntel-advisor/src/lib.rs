//! # cyntel-advisor
//!
//! Multi-source crypto assistant: market quotes, on-chain wallet valuation
//! and LLM commentary combined into one chat-style reply per command.
//!
//! ## Commands
//!
//! | Command     | Argument | Providers                         |
//! |-------------|----------|-----------------------------------|
//! | `price`     | ticker   | market data                       |
//! | `scan`      | ticker   | market data, narrative            |
//! | `portfolio` | wallet   | balances, market data, narrative  |
//! | `trending`  | none     | market data, narrative            |
//! | `signals`   | ticker   | market data, narrative            |
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐   ┌─────────────────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │ argument │──▶│ MarketDataClient    │──▶│ metrics  │──▶│ Narrative │──▶│ format   │
//! └──────────┘   │ BalanceClient       │   └──────────┘   │ Client    │   └──────────┘
//!                └─────────────────────┘                  └───────────┘
//! ```
//!
//! Every failure collapses into one of four user-facing classes
//! (`CommandFailure`); provider detail is logged, never shown.

pub mod balance;
pub mod error;
pub mod format;
pub mod market;
pub mod metrics;
pub mod model;
pub mod narrative;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use balance::{BalanceClient, MockBalanceClient, MoralisClient, MoralisConfig};
pub use error::{AdvisorError, CommandFailure, Result};
pub use format::help_text;
pub use market::{CoinGeckoClient, CoinGeckoConfig, MarketDataClient, MockMarketData};
pub use model::{Command, CommandResult};
pub use narrative::NarrativeClient;
pub use pipeline::{CommandPipeline, Reply};
