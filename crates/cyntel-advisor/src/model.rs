//! Domain Models
//!
//! Data types built while answering a single command.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The only chain wallet balances are read from
pub const SUPPORTED_CHAIN: &str = "base";

/// How many holdings / trending entries are displayed
pub const DISPLAY_LIMIT: usize = 5;

/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

/// A supported command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Price,
    Scan,
    Portfolio,
    Trending,
    Signals,
}

/// What kind of argument a command expects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentKind {
    Ticker,
    WalletAddress,
    None,
}

impl Command {
    pub const ALL: [Self; 5] = [
        Self::Price,
        Self::Scan,
        Self::Portfolio,
        Self::Trending,
        Self::Signals,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Scan => "scan",
            Self::Portfolio => "portfolio",
            Self::Trending => "trending",
            Self::Signals => "signals",
        }
    }

    pub const fn argument(self) -> ArgumentKind {
        match self {
            Self::Price | Self::Scan | Self::Signals => ArgumentKind::Ticker,
            Self::Portfolio => ArgumentKind::WalletAddress,
            Self::Trending => ArgumentKind::None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('/').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}

/// Market quote for one asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuote {
    /// Provider identifier (e.g., "bitcoin")
    pub id: String,

    /// Trading symbol (e.g., "BTC")
    pub symbol: String,

    /// Full name (e.g., "Bitcoin")
    pub name: String,

    /// Current price in USD
    pub price_usd: Decimal,

    /// 24-hour price change percentage
    pub change_24h_pct: Option<Decimal>,

    pub market_cap_usd: Option<Decimal>,
    pub volume_24h_usd: Option<Decimal>,

    /// Market cap rank
    pub rank: Option<u32>,

    pub high_24h_usd: Option<Decimal>,
    pub low_24h_usd: Option<Decimal>,
}

impl AssetQuote {
    /// Quote with only a price; all other market fields absent
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>, price_usd: Decimal) -> Self {
        Self {
            id: id.into().to_lowercase(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            price_usd,
            change_24h_pct: None,
            market_cap_usd: None,
            volume_24h_usd: None,
            rank: None,
            high_24h_usd: None,
            low_24h_usd: None,
        }
    }
}

/// Raw token balance as reported by the balance provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token symbol as reported on-chain
    pub symbol: String,

    pub name: Option<String>,

    /// Balance in the token's smallest unit
    pub raw_amount: u128,

    pub decimals: u32,

    pub chain: String,
}

impl TokenBalance {
    pub fn new(symbol: impl Into<String>, raw_amount: u128, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            raw_amount,
            decimals,
            chain: SUPPORTED_CHAIN.into(),
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.raw_amount == 0
    }

    /// Market-data ticker used to price this balance
    pub fn ticker(&self) -> String {
        self.symbol.trim().to_lowercase()
    }

    /// `raw_amount / 10^decimals`
    ///
    /// Drops least-significant digits when the exact value does not fit a
    /// `Decimal`; `None` only when even the integer part does not fit.
    pub fn normalized_amount(&self) -> Option<Decimal> {
        let max_mantissa = Decimal::MAX.mantissa().unsigned_abs();
        let mut raw = self.raw_amount;
        let mut scale = self.decimals;

        while scale > MAX_DECIMAL_SCALE || raw > max_mantissa {
            if scale == 0 {
                return None;
            }
            raw /= 10;
            scale -= 1;
        }

        let raw = i128::try_from(raw).ok()?;
        Decimal::try_from_i128_with_scale(raw, scale).ok()
    }
}

/// One priced position in a wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub amount: Decimal,
    pub value_usd: Decimal,
}

/// Valued wallet, holdings sorted by value descending
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub wallet_address: String,

    /// Sum over every priced holding, not only the displayed ones
    pub total_value_usd: Decimal,

    pub holdings: Vec<Holding>,
}

/// Asset flagged as trending by the market-data provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingEntry {
    /// Provider identifier, used for the follow-up quote lookup
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub rank: Option<u32>,

    /// Full quote, the partial quote embedded in the trending payload, or nothing
    pub quote: Option<AssetQuote>,
}

impl TrendingEntry {
    /// Rank from the trending payload, else from the attached quote
    pub fn display_rank(&self) -> Option<u32> {
        self.rank.or_else(|| self.quote.as_ref().and_then(|q| q.rank))
    }
}

/// Direction of the 24h move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Positive => "🟢",
            Self::Negative => "🔴",
            Self::Neutral => "⚪",
        }
    }
}

/// Inputs handed to the signal narrative
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInputs {
    pub price_usd: Decimal,
    pub change_24h_pct: Option<Decimal>,
    pub high_24h_usd: Option<Decimal>,
    pub low_24h_usd: Option<Decimal>,
    pub volume_24h_usd: Option<Decimal>,

    /// Where the price sits in the 24h low..high range (0 = low, 100 = high)
    pub range_position_pct: Option<Decimal>,

    /// Width of the 24h range relative to the low
    pub range_width_pct: Option<Decimal>,

    pub sentiment: Sentiment,
}

/// Which prompt skeleton a narrative was generated from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeKind {
    Scan,
    Portfolio,
    Trending,
    Signals,
}

/// Generated commentary; never persisted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub source_command: NarrativeKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResult {
    pub quote: AssetQuote,
    pub sentiment: Sentiment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub quote: AssetQuote,
    pub sentiment: Sentiment,
    pub narrative: Narrative,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub summary: PortfolioSummary,
    pub narrative: Narrative,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingResult {
    /// At most `DISPLAY_LIMIT` entries, in provider order
    pub entries: Vec<TrendingEntry>,
    pub narrative: Narrative,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalsResult {
    pub quote: AssetQuote,
    pub inputs: SignalInputs,
    pub narrative: Narrative,
}

/// Everything needed to render one command's response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum CommandResult {
    Price(PriceResult),
    Scan(ScanResult),
    Portfolio(PortfolioResult),
    Trending(TrendingResult),
    Signals(SignalsResult),
}

impl CommandResult {
    pub const fn command(&self) -> Command {
        match self {
            Self::Price(_) => Command::Price,
            Self::Scan(_) => Command::Scan,
            Self::Portfolio(_) => Command::Portfolio,
            Self::Trending(_) => Command::Trending,
            Self::Signals(_) => Command::Signals,
        }
    }

    pub fn narrative(&self) -> Option<&Narrative> {
        match self {
            Self::Price(_) => None,
            Self::Scan(r) => Some(&r.narrative),
            Self::Portfolio(r) => Some(&r.narrative),
            Self::Trending(r) => Some(&r.narrative),
            Self::Signals(r) => Some(&r.narrative),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trending_display_rank_falls_back_to_quote() {
        let mut quote = AssetQuote::new("pepe", "pepe", "Pepe", dec!(0.00001));
        quote.rank = Some(30);
        let mut entry = TrendingEntry {
            id: "pepe".into(),
            symbol: "PEPE".into(),
            name: "Pepe".into(),
            rank: None,
            quote: Some(quote),
        };
        assert_eq!(entry.display_rank(), Some(30));

        entry.rank = Some(28);
        assert_eq!(entry.display_rank(), Some(28));

        entry.rank = None;
        entry.quote = None;
        assert_eq!(entry.display_rank(), None);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!("price".parse::<Command>().unwrap(), Command::Price);
        assert_eq!("/Signals".parse::<Command>().unwrap(), Command::Signals);
        assert_eq!(" TRENDING ".parse::<Command>().unwrap(), Command::Trending);
        assert!("start".parse::<Command>().is_err());
        assert_eq!(Command::Portfolio.argument(), ArgumentKind::WalletAddress);
        assert_eq!(Command::Trending.argument(), ArgumentKind::None);
    }

    #[test]
    fn test_normalized_amount() {
        assert_eq!(TokenBalance::new("A", 100, 2).normalized_amount(), Some(dec!(1.00)));
        assert_eq!(TokenBalance::new("USDC", 2_500_000, 6).normalized_amount(), Some(dec!(2.5)));
        assert_eq!(
            TokenBalance::new("WETH", 1_234_500_000_000_000_000, 18).normalized_amount(),
            Some(dec!(1.2345))
        );
        assert_eq!(TokenBalance::new("A", 0, 18).normalized_amount(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_normalized_amount_drops_excess_precision() {
        // 10^30 base units at 36 decimals = 1e-6, scale beyond 28 is truncated
        let tiny = TokenBalance::new("DUST", 10u128.pow(30), 36);
        assert_eq!(tiny.normalized_amount(), Some(dec!(0.000001)));

        // Larger than a 96-bit mantissa but still representable after rounding down
        let huge = TokenBalance::new("MEME", u128::MAX, 18);
        let amount = huge.normalized_amount().unwrap();
        assert_eq!(amount.trunc().to_string(), "340282366920938463463");

        // Integer part alone exceeds Decimal::MAX
        assert_eq!(TokenBalance::new("X", u128::MAX, 0).normalized_amount(), None);
    }

    #[test]
    fn test_ticker_is_lowercase_symbol() {
        assert_eq!(TokenBalance::new(" USDC ", 1, 6).ticker(), "usdc");
    }

    #[test]
    fn test_quote_normalizes_identifiers() {
        let quote = AssetQuote::new("Bitcoin", "btc", "Bitcoin", dec!(65000));
        assert_eq!(quote.id, "bitcoin");
        assert_eq!(quote.symbol, "BTC");
        assert!(quote.rank.is_none());
    }
}
