//! Command Pipeline
//!
//! Every command runs through the same stages:
//!
//! ```text
//! ValidatingInput ─▶ FetchingData ─▶ DerivingMetrics ─▶ GeneratingNarrative? ─▶ Formatting ─▶ Done
//!        │                 │                                    │
//!        └─────────────────┴──────────── Failed ◀───────────────┘
//! ```
//!
//! A `CommandStrategy` supplies the per-command pieces; the pipeline owns
//! sequencing, failure classification and logging.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::Instrument;

use crate::balance::BalanceClient;
use crate::error::{AdvisorError, CommandFailure};
use crate::format::{format_amount, format_percent, format_usd, render, render_failure};
use crate::market::MarketDataClient;
use crate::metrics::{aggregate_portfolio, sentiment_marker, signal_inputs, top_n};
use crate::model::{
    ArgumentKind, AssetQuote, Command, CommandResult, DISPLAY_LIMIT, Narrative, NarrativeKind,
    PortfolioResult, PortfolioSummary, PriceResult, SUPPORTED_CHAIN, ScanResult, Sentiment,
    SignalInputs, SignalsResult, TokenBalance, TrendingEntry, TrendingResult,
};
use crate::narrative::{NarrativeClient, NarrativeFields};

/// Pipeline stage, logged on every transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ValidatingInput,
    FetchingData,
    DerivingMetrics,
    GeneratingNarrative,
    Formatting,
    Done,
}

/// External data providers available to strategies
#[derive(Clone)]
pub struct DataSources {
    pub market: Arc<dyn MarketDataClient>,
    pub balances: Arc<dyn BalanceClient>,
}

/// Per-command behaviour plugged into the pipeline
#[async_trait]
pub trait CommandStrategy: Send + Sync {
    type Fetched: Send;
    type Derived: Send;

    fn command(&self) -> Command;

    /// Call the providers; `argument` is already trimmed and lowercased
    async fn fetch(&self, sources: &DataSources, argument: &str) -> Result<Self::Fetched, CommandFailure>;

    /// Pure metric derivation
    fn derive(&self, fetched: Self::Fetched) -> Self::Derived;

    /// Prompt skeleton and fields, or `None` when the command has no narrative
    fn narrative_request(&self, derived: &Self::Derived) -> Option<(NarrativeKind, NarrativeFields)>;

    fn assemble(
        &self,
        derived: Self::Derived,
        narrative: Option<Narrative>,
    ) -> Result<CommandResult, CommandFailure>;
}

/// Rendered outcome of one command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub command: Command,
    pub text: String,
    pub failure: Option<CommandFailure>,
}

impl Reply {
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Runs commands against injected providers
pub struct CommandPipeline {
    sources: DataSources,
    narrator: NarrativeClient,
}

impl CommandPipeline {
    pub fn new(
        market: Arc<dyn MarketDataClient>,
        balances: Arc<dyn BalanceClient>,
        narrator: NarrativeClient,
    ) -> Self {
        Self {
            sources: DataSources { market, balances },
            narrator,
        }
    }

    pub const fn sources(&self) -> &DataSources {
        &self.sources
    }

    pub const fn narrator(&self) -> &NarrativeClient {
        &self.narrator
    }

    /// Run a command and render the message shown to the user
    pub async fn respond(&self, command: Command, raw_argument: &str) -> Reply {
        match self.execute(command, raw_argument).await {
            Ok(result) => Reply {
                command,
                text: render(&result),
                failure: None,
            },
            Err(failure) => Reply {
                command,
                text: render_failure(command, &failure),
                failure: Some(failure),
            },
        }
    }

    /// Run a command up to the structured result
    pub async fn execute(
        &self,
        command: Command,
        raw_argument: &str,
    ) -> Result<CommandResult, CommandFailure> {
        let span = tracing::info_span!("command", %command);
        async {
            match command {
                Command::Price => self.run(&PriceCommand, raw_argument).await,
                Command::Scan => self.run(&ScanCommand, raw_argument).await,
                Command::Portfolio => self.run(&PortfolioCommand, raw_argument).await,
                Command::Trending => self.run(&TrendingCommand, raw_argument).await,
                Command::Signals => self.run(&SignalsCommand, raw_argument).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn run<S: CommandStrategy>(
        &self,
        strategy: &S,
        raw_argument: &str,
    ) -> Result<CommandResult, CommandFailure> {
        let mut stage = Stage::ValidatingInput;
        let outcome = self.advance(strategy, raw_argument, &mut stage).await;

        match &outcome {
            Ok(_) => enter(&mut stage, Stage::Done),
            Err(failure) => tracing::warn!(
                failed_at = ?stage,
                category = failure.category(),
                "Command failed"
            ),
        }
        outcome
    }

    async fn advance<S: CommandStrategy>(
        &self,
        strategy: &S,
        raw_argument: &str,
        stage: &mut Stage,
    ) -> Result<CommandResult, CommandFailure> {
        enter(stage, Stage::ValidatingInput);
        let argument = validate_argument(strategy.command(), raw_argument)?;

        enter(stage, Stage::FetchingData);
        let fetched = strategy.fetch(&self.sources, &argument).await?;

        enter(stage, Stage::DerivingMetrics);
        let derived = strategy.derive(fetched);

        let narrative = match strategy.narrative_request(&derived) {
            Some((kind, fields)) => {
                enter(stage, Stage::GeneratingNarrative);
                let narrative = self.narrator.generate(kind, &fields).await.map_err(|e| {
                    tracing::warn!(
                        provider = self.narrator.provider_name(),
                        category = e.category(),
                        error = %e,
                        "Narrative generation failed"
                    );
                    CommandFailure::NarrativeUnavailable
                })?;
                Some(narrative)
            }
            None => None,
        };

        enter(stage, Stage::Formatting);
        strategy.assemble(derived, narrative)
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    *stage = next;
    tracing::debug!(stage = ?next, "Stage");
}

/// First whitespace-separated token, lowercased; commands without an argument ignore it
pub fn validate_argument(command: Command, raw: &str) -> Result<String, CommandFailure> {
    match command.argument() {
        ArgumentKind::None => Ok(String::new()),
        ArgumentKind::Ticker | ArgumentKind::WalletAddress => raw
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
            .ok_or(CommandFailure::MissingArgument),
    }
}

/// Classify a provider failure that aborts the command
fn abort(err: AdvisorError) -> CommandFailure {
    if err.is_not_found() {
        tracing::debug!(error = %err, "No match at provider");
    } else {
        tracing::warn!(error = %err, "Provider call failed");
    }
    err.into()
}

fn optional<T>(value: Option<T>, render: impl FnOnce(T) -> String) -> Option<String> {
    value.map(render)
}

fn quote_fields(quote: &AssetQuote) -> NarrativeFields {
    NarrativeFields::new()
        .with("name", quote.name.clone())
        .with("symbol", quote.symbol.clone())
        .with("price", format_usd(quote.price_usd))
        .with_opt("change", optional(quote.change_24h_pct, format_percent))
        .with_opt("rank", optional(quote.rank, |r| r.to_string()))
        .with_opt("volume", optional(quote.volume_24h_usd, format_usd))
        .with_opt("market_cap", optional(quote.market_cap_usd, format_usd))
}

// ============================================================================
// Price
// ============================================================================

pub struct PriceCommand;

#[async_trait]
impl CommandStrategy for PriceCommand {
    type Fetched = AssetQuote;
    type Derived = PriceResult;

    fn command(&self) -> Command {
        Command::Price
    }

    async fn fetch(&self, sources: &DataSources, argument: &str) -> Result<AssetQuote, CommandFailure> {
        sources.market.get_quote(argument).await.map_err(abort)
    }

    fn derive(&self, quote: AssetQuote) -> PriceResult {
        PriceResult {
            sentiment: sentiment_marker(quote.change_24h_pct),
            quote,
        }
    }

    fn narrative_request(&self, _: &PriceResult) -> Option<(NarrativeKind, NarrativeFields)> {
        None
    }

    fn assemble(&self, derived: PriceResult, _: Option<Narrative>) -> Result<CommandResult, CommandFailure> {
        Ok(CommandResult::Price(derived))
    }
}

// ============================================================================
// Scan
// ============================================================================

pub struct ScanCommand;

#[async_trait]
impl CommandStrategy for ScanCommand {
    type Fetched = AssetQuote;
    type Derived = PriceResult;

    fn command(&self) -> Command {
        Command::Scan
    }

    async fn fetch(&self, sources: &DataSources, argument: &str) -> Result<AssetQuote, CommandFailure> {
        sources.market.get_quote(argument).await.map_err(abort)
    }

    fn derive(&self, quote: AssetQuote) -> PriceResult {
        PriceCommand.derive(quote)
    }

    fn narrative_request(&self, derived: &PriceResult) -> Option<(NarrativeKind, NarrativeFields)> {
        Some((NarrativeKind::Scan, quote_fields(&derived.quote)))
    }

    fn assemble(
        &self,
        derived: PriceResult,
        narrative: Option<Narrative>,
    ) -> Result<CommandResult, CommandFailure> {
        Ok(CommandResult::Scan(ScanResult {
            quote: derived.quote,
            sentiment: derived.sentiment,
            narrative: narrative.ok_or(CommandFailure::NarrativeUnavailable)?,
        }))
    }
}

// ============================================================================
// Portfolio
// ============================================================================

pub struct PortfolioCommand;

pub struct WalletSnapshot {
    pub address: String,
    pub balances: Vec<TokenBalance>,

    /// USD price per ticker, for the tickers that could be priced
    pub prices: HashMap<String, Decimal>,
}

/// Price each distinct ticker of the non-zero balances, in provider order.
///
/// Per-holding failures are swallowed: the ticker stays unpriced and its
/// holding is later dropped from the summary.
async fn price_holdings(market: &dyn MarketDataClient, balances: &[TokenBalance]) -> HashMap<String, Decimal> {
    let mut prices = HashMap::new();
    let mut attempted = Vec::new();

    for balance in balances.iter().filter(|b| !b.is_zero()) {
        let ticker = balance.ticker();
        if attempted.contains(&ticker) {
            continue;
        }
        attempted.push(ticker.clone());

        match market.get_simple_price(&ticker).await {
            Ok(price) => {
                prices.insert(ticker, price);
            }
            Err(e) => tracing::debug!(%ticker, error = %e, "Skipping unpriced holding"),
        }
    }
    prices
}

#[async_trait]
impl CommandStrategy for PortfolioCommand {
    type Fetched = WalletSnapshot;
    type Derived = PortfolioSummary;

    fn command(&self) -> Command {
        Command::Portfolio
    }

    async fn fetch(&self, sources: &DataSources, argument: &str) -> Result<WalletSnapshot, CommandFailure> {
        let balances = sources
            .balances
            .get_wallet_balances(argument, SUPPORTED_CHAIN)
            .await
            .map_err(|e| {
                tracing::warn!(provider = sources.balances.name(), error = %e, "Balance lookup failed");
                CommandFailure::DataUnavailable
            })?;

        if balances.is_empty() {
            tracing::info!("Wallet has no token balances");
            return Err(CommandFailure::DataUnavailable);
        }

        let prices = price_holdings(sources.market.as_ref(), &balances).await;
        tracing::debug!(balances = balances.len(), priced = prices.len(), "Wallet fetched");

        Ok(WalletSnapshot {
            address: argument.to_string(),
            balances,
            prices,
        })
    }

    fn derive(&self, snapshot: WalletSnapshot) -> PortfolioSummary {
        aggregate_portfolio(&snapshot.address, &snapshot.balances, |ticker| {
            snapshot.prices.get(ticker).copied()
        })
    }

    fn narrative_request(&self, summary: &PortfolioSummary) -> Option<(NarrativeKind, NarrativeFields)> {
        let top = top_n(&summary.holdings, DISPLAY_LIMIT);
        let holdings = if top.is_empty() {
            "none priced".to_string()
        } else {
            top.iter()
                .map(|h| format!("{} {} ({})", format_amount(h.amount), h.symbol, format_usd(h.value_usd)))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Some((
            NarrativeKind::Portfolio,
            NarrativeFields::new()
                .with("total", format_usd(summary.total_value_usd))
                .with("holdings", holdings),
        ))
    }

    fn assemble(
        &self,
        summary: PortfolioSummary,
        narrative: Option<Narrative>,
    ) -> Result<CommandResult, CommandFailure> {
        Ok(CommandResult::Portfolio(PortfolioResult {
            summary,
            narrative: narrative.ok_or(CommandFailure::NarrativeUnavailable)?,
        }))
    }
}

// ============================================================================
// Trending
// ============================================================================

pub struct TrendingCommand;

#[async_trait]
impl CommandStrategy for TrendingCommand {
    type Fetched = Vec<TrendingEntry>;
    type Derived = Vec<TrendingEntry>;

    fn command(&self) -> Command {
        Command::Trending
    }

    async fn fetch(&self, sources: &DataSources, _: &str) -> Result<Vec<TrendingEntry>, CommandFailure> {
        let mut entries = sources.market.get_trending().await.map_err(abort)?;
        if entries.is_empty() {
            tracing::warn!("Trending list is empty");
            return Err(CommandFailure::DataUnavailable);
        }
        entries.truncate(DISPLAY_LIMIT);

        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        let quotes = sources.market.get_quotes(&ids).await;

        // A failed follow-up lookup keeps whatever the trending payload carried
        for (entry, quote) in entries.iter_mut().zip(quotes) {
            match quote {
                Ok(quote) => entry.quote = Some(quote),
                Err(e) => tracing::debug!(id = %entry.id, error = %e, "Keeping partial trending entry"),
            }
        }
        Ok(entries)
    }

    fn derive(&self, entries: Vec<TrendingEntry>) -> Vec<TrendingEntry> {
        entries
    }

    fn narrative_request(&self, entries: &Vec<TrendingEntry>) -> Option<(NarrativeKind, NarrativeFields)> {
        let lines: Vec<String> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let quote = entry.quote.as_ref();
                format!(
                    "{}. {} ({}): price {}, 24h change {}, rank #{}",
                    i + 1,
                    entry.symbol,
                    entry.name,
                    optional(quote.map(|q| q.price_usd), format_usd).unwrap_or_else(|| "N/A".into()),
                    optional(quote.and_then(|q| q.change_24h_pct), format_percent)
                        .unwrap_or_else(|| "N/A".into()),
                    optional(entry.display_rank(), |r| r.to_string()).unwrap_or_else(|| "N/A".into()),
                )
            })
            .collect();

        Some((
            NarrativeKind::Trending,
            NarrativeFields::new().with("entries", lines.join("\n")),
        ))
    }

    fn assemble(
        &self,
        entries: Vec<TrendingEntry>,
        narrative: Option<Narrative>,
    ) -> Result<CommandResult, CommandFailure> {
        Ok(CommandResult::Trending(TrendingResult {
            entries,
            narrative: narrative.ok_or(CommandFailure::NarrativeUnavailable)?,
        }))
    }
}

// ============================================================================
// Signals
// ============================================================================

pub struct SignalsCommand;

fn plain_percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

const fn momentum(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "positive",
        Sentiment::Negative => "negative",
        Sentiment::Neutral => "flat",
    }
}

#[async_trait]
impl CommandStrategy for SignalsCommand {
    type Fetched = AssetQuote;
    type Derived = (AssetQuote, SignalInputs);

    fn command(&self) -> Command {
        Command::Signals
    }

    async fn fetch(&self, sources: &DataSources, argument: &str) -> Result<AssetQuote, CommandFailure> {
        sources.market.get_quote(argument).await.map_err(abort)
    }

    fn derive(&self, quote: AssetQuote) -> (AssetQuote, SignalInputs) {
        let inputs = signal_inputs(&quote);
        (quote, inputs)
    }

    fn narrative_request(
        &self,
        (quote, inputs): &(AssetQuote, SignalInputs),
    ) -> Option<(NarrativeKind, NarrativeFields)> {
        Some((
            NarrativeKind::Signals,
            NarrativeFields::new()
                .with("symbol", quote.symbol.clone())
                .with("price", format_usd(inputs.price_usd))
                .with_opt("change", optional(inputs.change_24h_pct, format_percent))
                .with_opt("high", optional(inputs.high_24h_usd, format_usd))
                .with_opt("low", optional(inputs.low_24h_usd, format_usd))
                .with_opt("range_position", optional(inputs.range_position_pct, plain_percent))
                .with_opt("range_width", optional(inputs.range_width_pct, plain_percent))
                .with_opt("volume", optional(inputs.volume_24h_usd, format_usd))
                .with("momentum", momentum(inputs.sentiment)),
        ))
    }

    fn assemble(
        &self,
        (quote, inputs): (AssetQuote, SignalInputs),
        narrative: Option<Narrative>,
    ) -> Result<CommandResult, CommandFailure> {
        Ok(CommandResult::Signals(SignalsResult {
            quote,
            inputs,
            narrative: narrative.ok_or(CommandFailure::NarrativeUnavailable)?,
        }))
    }
}
