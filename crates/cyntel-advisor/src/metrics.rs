//! Metric Derivation
//!
//! Pure, deterministic functions turning raw provider data into the fields
//! rendered in responses and fed to narratives. No I/O happens here.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{AssetQuote, Holding, PortfolioSummary, Sentiment, SignalInputs, TokenBalance};

/// Sign of the 24h change; zero and absent are both neutral
pub fn sentiment_marker(change_24h_pct: Option<Decimal>) -> Sentiment {
    match change_24h_pct {
        Some(c) if c > Decimal::ZERO => Sentiment::Positive,
        Some(c) if c < Decimal::ZERO => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// Value a wallet from its balances.
///
/// Zero balances are skipped before `price_lookup` is consulted. A balance
/// whose lookup yields `None` is dropped from both the holdings and the
/// total: a partially priced portfolio is still a valid answer.
///
/// Values are computed with checked arithmetic. A holding whose value
/// overflows `Decimal` is dropped the same way as an unpriced one. A holding
/// whose value would push the running total past `Decimal::MAX` (summed in
/// display order) is dropped too, so the total always equals the sum of the
/// listed holdings.
pub fn aggregate_portfolio<F>(
    wallet_address: &str,
    balances: &[TokenBalance],
    mut price_lookup: F,
) -> PortfolioSummary
where
    F: FnMut(&str) -> Option<Decimal>,
{
    let mut holdings: Vec<Holding> = balances
        .iter()
        .filter(|b| !b.is_zero())
        .filter_map(|balance| {
            let price = price_lookup(&balance.ticker())?;
            let amount = balance.normalized_amount()?;
            let Some(value_usd) = amount.checked_mul(price) else {
                tracing::debug!(symbol = %balance.symbol, "Holding value overflows, skipping");
                return None;
            };
            Some(Holding {
                symbol: balance.symbol.trim().to_string(),
                amount,
                value_usd,
            })
        })
        .collect();

    holdings.sort_by(compare_holdings);

    let mut total_value_usd = Decimal::ZERO;
    holdings.retain(|holding| match total_value_usd.checked_add(holding.value_usd) {
        Some(total) => {
            total_value_usd = total;
            true
        }
        None => {
            tracing::debug!(symbol = %holding.symbol, "Portfolio total overflows, skipping holding");
            false
        }
    });

    PortfolioSummary {
        wallet_address: wallet_address.to_string(),
        total_value_usd,
        holdings,
    }
}

/// Value descending, then symbol ascending
fn compare_holdings(a: &Holding, b: &Holding) -> Ordering {
    b.value_usd
        .cmp(&a.value_usd)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// First `n` items
pub fn top_n<T>(items: &[T], n: usize) -> &[T] {
    &items[..items.len().min(n)]
}

/// Derive the inputs of the signal narrative from a quote
pub fn signal_inputs(quote: &AssetQuote) -> SignalInputs {
    let (range_position_pct, range_width_pct) = match (quote.high_24h_usd, quote.low_24h_usd) {
        (Some(high), Some(low)) if low > Decimal::ZERO && high > low => {
            let width = high - low;
            let position = quote
                .price_usd
                .checked_sub(low)
                .and_then(|offset| offset.checked_div(width))
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .map(|p| p.clamp(Decimal::ZERO, dec!(100)));
            let width_pct = width
                .checked_div(low)
                .and_then(|ratio| ratio.checked_mul(dec!(100)));
            (position, width_pct)
        }
        _ => (None, None),
    };

    SignalInputs {
        price_usd: quote.price_usd,
        change_24h_pct: quote.change_24h_pct,
        high_24h_usd: quote.high_24h_usd,
        low_24h_usd: quote.low_24h_usd,
        volume_24h_usd: quote.volume_24h_usd,
        range_position_pct,
        range_width_pct,
        sentiment: sentiment_marker(quote.change_24h_pct),
    }
}
