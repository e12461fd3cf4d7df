//! Response Formatting
//!
//! Renders command results and failures as the chat-style text returned to
//! users. Formatting never fails: absent values render as `N/A`.

use std::fmt::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CommandFailure;
use crate::metrics::{sentiment_marker, top_n};
use crate::model::{
    ArgumentKind, AssetQuote, Command, CommandResult, DISPLAY_LIMIT, PortfolioResult, PriceResult,
    ScanResult, SignalsResult, TrendingResult,
};

const NOT_AVAILABLE: &str = "N/A";

/// `$` + thousands-grouped amount with two decimals; the sign precedes `$`
pub fn format_usd(value: Decimal) -> String {
    let rounded = round(value, 2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{sign}${}.{frac_part}", group_thousands(int_part))
}

/// Always signed, two decimals; zero is `+0.00%`
pub fn format_percent(value: Decimal) -> String {
    let rounded = round(value, 2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{:.2}%", rounded.abs())
    } else {
        format!("+{:.2}%", rounded.abs())
    }
}

/// Token amount with four decimals
pub fn format_amount(value: Decimal) -> String {
    format!("{:.4}", round(value, 4))
}

/// `0x1234...abcd`; short inputs are returned whole
pub fn abbreviate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn usd_or_na(value: Option<Decimal>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), format_usd)
}

fn percent_or_na(value: Option<Decimal>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), format_percent)
}

fn rank_or_na(rank: Option<u32>) -> String {
    rank.map_or_else(|| NOT_AVAILABLE.to_string(), |r| r.to_string())
}

fn ticker_label(quote: &AssetQuote) -> String {
    quote.id.to_uppercase()
}

/// Render a successful command
pub fn render(result: &CommandResult) -> String {
    match result {
        CommandResult::Price(r) => render_price(r),
        CommandResult::Scan(r) => render_scan(r),
        CommandResult::Portfolio(r) => render_portfolio(r),
        CommandResult::Trending(r) => render_trending(r),
        CommandResult::Signals(r) => render_signals(r),
    }
}

fn render_price(result: &PriceResult) -> String {
    let quote = &result.quote;
    format!(
        "📊 {}\n\n💰 Price: {}\n{} 24h Change: {}\n🧢 Market Cap: {}",
        ticker_label(quote),
        format_usd(quote.price_usd),
        result.sentiment.marker(),
        percent_or_na(quote.change_24h_pct),
        usd_or_na(quote.market_cap_usd),
    )
}

fn render_scan(result: &ScanResult) -> String {
    let quote = &result.quote;
    format!(
        "🧠 Cyntel AI Analysis — {}\n\n💰 {}   |   {} (24h)\n📊 Rank #{}   |   Volume {}\n\n{}",
        ticker_label(quote),
        format_usd(quote.price_usd),
        percent_or_na(quote.change_24h_pct),
        rank_or_na(quote.rank),
        usd_or_na(quote.volume_24h_usd),
        result.narrative.text,
    )
}

fn render_portfolio(result: &PortfolioResult) -> String {
    let summary = &result.summary;
    let mut out = format!(
        "💼 Portfolio for {}\n\n📈 Total Value: {}\n\nTop Holdings:\n",
        abbreviate_address(&summary.wallet_address),
        format_usd(summary.total_value_usd),
    );

    let holdings = top_n(&summary.holdings, DISPLAY_LIMIT);
    if holdings.is_empty() {
        out.push_str("- No priced holdings\n");
    }
    for holding in holdings {
        let _ = writeln!(
            out,
            "- {}: {} ({})",
            holding.symbol,
            format_amount(holding.amount),
            format_usd(holding.value_usd)
        );
    }

    let _ = write!(out, "\n🧠 AI Assessment:\n{}", result.narrative.text);
    out
}

fn render_trending(result: &TrendingResult) -> String {
    let mut out = String::from("🔥 Trending Now\n\n");

    for (i, entry) in top_n(&result.entries, DISPLAY_LIMIT).iter().enumerate() {
        let quote = entry.quote.as_ref();
        let change = quote.and_then(|q| q.change_24h_pct);
        let _ = writeln!(
            out,
            "{}. {} ({}) — {} | {} {} | Rank #{}",
            i + 1,
            entry.symbol,
            entry.name,
            usd_or_na(quote.map(|q| q.price_usd)),
            sentiment_marker(change).marker(),
            percent_or_na(change),
            rank_or_na(entry.display_rank()),
        );
    }

    let _ = write!(out, "\n🧠 AI Take:\n{}", result.narrative.text);
    out
}

fn render_signals(result: &SignalsResult) -> String {
    let inputs = &result.inputs;
    format!(
        "📡 Cyntel AI Signal — {}\n\n💰 {}   |   {} {} (24h)\n📈 24h High: {}   |   📉 24h Low: {}\n📊 Volume: {}\n\n{}\n\n⚠️ Not financial advice.",
        ticker_label(&result.quote),
        format_usd(inputs.price_usd),
        inputs.sentiment.marker(),
        percent_or_na(inputs.change_24h_pct),
        usd_or_na(inputs.high_24h_usd),
        usd_or_na(inputs.low_24h_usd),
        usd_or_na(inputs.volume_24h_usd),
        result.narrative.text,
    )
}

/// Render the user-facing message for a failed command
pub fn render_failure(command: Command, failure: &CommandFailure) -> String {
    match failure {
        CommandFailure::MissingArgument => match command.argument() {
            ArgumentKind::WalletAddress => {
                "Please provide a Base wallet address.\nExample: /portfolio 0x1234...abcd".to_string()
            }
            _ => format!("Please provide a ticker.\nExample: /{command} bitcoin"),
        },
        CommandFailure::NotFound(ticker) => match command {
            Command::Scan => format!("❌ No data found for {}", ticker.to_uppercase()),
            _ => format!(
                "❌ Could not find {}. Try 'bitcoin', 'ethereum', 'solana', etc.",
                ticker.to_uppercase()
            ),
        },
        CommandFailure::DataUnavailable => match command {
            Command::Portfolio => "❌ Could not load on-chain data for that wallet.".to_string(),
            Command::Trending => "⚠️ Trending data unavailable. Please try again later.".to_string(),
            _ => "⚠️ Market data unavailable. Please try again later.".to_string(),
        },
        CommandFailure::NarrativeUnavailable => {
            "⚠️ AI analysis failed. Please try again later.".to_string()
        }
    }
}

/// Welcome and help message listing every command
pub fn help_text() -> String {
    let mut out = String::from("Welcome to Cyntel AI 🚀\n\nAvailable commands:\n");
    for command in Command::ALL {
        let usage = match command.argument() {
            ArgumentKind::Ticker => " <ticker>",
            ArgumentKind::WalletAddress => " <wallet>",
            ArgumentKind::None => "",
        };
        let _ = writeln!(out, "/{command}{usage} — {}", describe(command));
    }
    out.push_str("/help — show this message\n\nExample: /price bitcoin or /portfolio 0x1234...abcd");
    out
}

const fn describe(command: Command) -> &'static str {
    match command {
        Command::Price => "get current price & 24h change",
        Command::Scan => "deep analysis with AI insights",
        Command::Portfolio => "track Base wallet holdings",
        Command::Trending => "top trending assets with AI take",
        Command::Signals => "structured AI trade signal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Holding, Narrative, NarrativeKind, PortfolioSummary, Sentiment, TrendingEntry,
    };
    use rust_decimal_macros::dec;

    fn narrative(kind: NarrativeKind) -> Narrative {
        Narrative {
            text: "Looks stretched.".into(),
            source_command: kind,
        }
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec!(65000)), "$65,000.00");
        assert_eq!(format_usd(dec!(1280000000000)), "$1,280,000,000,000.00");
        assert_eq!(format_usd(dec!(0.005)), "$0.01");
        assert_eq!(format_usd(dec!(999.995)), "$1,000.00");
        assert_eq!(format_usd(dec!(-1234.5)), "-$1,234.50");
        assert_eq!(format_usd(dec!(-0.001)), "$0.00");
        assert_eq!(format_usd(dec!(100)), "$100.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(2.5)), "+2.50%");
        assert_eq!(format_percent(dec!(-3.456)), "-3.46%");
        assert_eq!(format_percent(Decimal::ZERO), "+0.00%");
        assert_eq!(format_percent(dec!(-0.004)), "+0.00%");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1)), "1.0000");
        assert_eq!(format_amount(dec!(0.123456)), "0.1235");
    }

    #[test]
    fn test_abbreviate_address() {
        assert_eq!(
            abbreviate_address("0x1234567890abcdef1234567890abcdef1234abcd"),
            "0x1234...abcd"
        );
        assert_eq!(abbreviate_address("0x12345678"), "0x12345678");
    }

    #[test]
    fn test_render_price_example() {
        let mut quote = AssetQuote::new("bitcoin", "btc", "Bitcoin", dec!(65000.00));
        quote.change_24h_pct = Some(dec!(2.50));
        quote.market_cap_usd = Some(dec!(1280000000000));

        let text = render(&CommandResult::Price(PriceResult {
            quote,
            sentiment: Sentiment::Positive,
        }));

        assert_eq!(
            text,
            "📊 BITCOIN\n\n💰 Price: $65,000.00\n🟢 24h Change: +2.50%\n🧢 Market Cap: $1,280,000,000,000.00"
        );
    }

    #[test]
    fn test_render_scan_with_absent_fields() {
        let quote = AssetQuote::new("newcoin", "new", "New", dec!(0.5));
        let text = render(&CommandResult::Scan(ScanResult {
            quote,
            sentiment: Sentiment::Neutral,
            narrative: narrative(NarrativeKind::Scan),
        }));

        assert!(text.starts_with("🧠 Cyntel AI Analysis — NEWCOIN"));
        assert!(text.contains("N/A (24h)"));
        assert!(text.contains("Rank #N/A   |   Volume N/A"));
        assert!(text.ends_with("Looks stretched."));
    }

    #[test]
    fn test_render_portfolio_example() {
        let summary = PortfolioSummary {
            wallet_address: "0x1234567890abcdef1234567890abcdef12345678".into(),
            total_value_usd: dec!(10.00),
            holdings: vec![Holding {
                symbol: "A".into(),
                amount: dec!(1.00),
                value_usd: dec!(10.00),
            }],
        };
        let text = render(&CommandResult::Portfolio(PortfolioResult {
            summary,
            narrative: narrative(NarrativeKind::Portfolio),
        }));

        assert_eq!(
            text,
            "💼 Portfolio for 0x1234...5678\n\n📈 Total Value: $10.00\n\nTop Holdings:\n- A: 1.0000 ($10.00)\n\n🧠 AI Assessment:\nLooks stretched."
        );
    }

    #[test]
    fn test_render_portfolio_caps_and_handles_empty() {
        let holdings: Vec<Holding> = (0..7)
            .map(|i| Holding {
                symbol: format!("T{i}"),
                amount: dec!(1),
                value_usd: dec!(1),
            })
            .collect();
        let mut result = PortfolioResult {
            summary: PortfolioSummary {
                wallet_address: "0xabc".into(),
                total_value_usd: dec!(7),
                holdings,
            },
            narrative: narrative(NarrativeKind::Portfolio),
        };

        let text = render(&CommandResult::Portfolio(result.clone()));
        assert_eq!(text.matches("\n- T").count(), 5);
        assert!(text.contains("Total Value: $7.00"));

        result.summary.holdings.clear();
        let text = render(&CommandResult::Portfolio(result));
        assert!(text.contains("- No priced holdings"));
    }

    #[test]
    fn test_render_trending_partial_quotes() {
        let mut quoted = AssetQuote::new("pepe", "pepe", "Pepe", dec!(0.0000125));
        quoted.change_24h_pct = Some(dec!(-4.1));
        let entries = vec![
            TrendingEntry {
                id: "pepe".into(),
                symbol: "PEPE".into(),
                name: "Pepe".into(),
                rank: Some(30),
                quote: Some(quoted),
            },
            TrendingEntry {
                id: "mystery".into(),
                symbol: "MYST".into(),
                name: "Mystery".into(),
                rank: None,
                quote: None,
            },
        ];

        let text = render(&CommandResult::Trending(TrendingResult {
            entries,
            narrative: narrative(NarrativeKind::Trending),
        }));

        assert!(text.contains("1. PEPE (Pepe) — $0.00 | 🔴 -4.10% | Rank #30"));
        assert!(text.contains("2. MYST (Mystery) — N/A | ⚪ N/A | Rank #N/A"));
        assert!(text.ends_with("🧠 AI Take:\nLooks stretched."));
    }

    #[test]
    fn test_render_failures() {
        assert_eq!(
            render_failure(Command::Price, &CommandFailure::MissingArgument),
            "Please provide a ticker.\nExample: /price bitcoin"
        );
        assert!(render_failure(Command::Portfolio, &CommandFailure::MissingArgument)
            .contains("wallet address"));
        assert_eq!(
            render_failure(Command::Price, &CommandFailure::NotFound("dogwifhat".into())),
            "❌ Could not find DOGWIFHAT. Try 'bitcoin', 'ethereum', 'solana', etc."
        );
        assert_eq!(
            render_failure(Command::Scan, &CommandFailure::NotFound("dogwifhat".into())),
            "❌ No data found for DOGWIFHAT"
        );
        assert!(render_failure(Command::Signals, &CommandFailure::DataUnavailable)
            .starts_with("⚠️ Market data unavailable"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = help_text();
        for command in Command::ALL {
            assert!(help.contains(&format!("/{command}")));
        }
        assert!(help.contains("/portfolio <wallet>"));
    }
}
