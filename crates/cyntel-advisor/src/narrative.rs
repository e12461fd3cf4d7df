//! Narrative Generation
//!
//! Turns derived metrics into short analyst commentary through any
//! `LlmProvider`. Each narrative kind has a fixed prompt skeleton with
//! `{field}` placeholders; a field without a value renders as `N/A`.

use std::collections::BTreeMap;
use std::sync::Arc;

use cyntel_core::{GenerationOptions, LlmError, LlmProvider, Message};

use crate::model::{Narrative, NarrativeKind};

/// Output budget for signals, which must fit six mandated sections
const SIGNALS_MAX_TOKENS: u32 = 350;

const MISSING_FIELD: &str = "N/A";

const SYSTEM_PROMPT: &str = "You are Cyntel, a terse crypto market analyst. \
Base every statement on the figures provided. Never hype or promote an asset.";

const SCAN_TEMPLATE: &str = "Analyze this cryptocurrency objectively and analytically:
- Asset: {name} ({symbol})
- Current price: {price}
- 24h price change: {change}
- Market cap rank: #{rank}
- 24h trading volume: {volume}
- Market cap: {market_cap}

Give a short, direct assessment (2-4 sentences). Be analytical. Include slight cynicism if \
the data shows red flags (e.g. low volume, extreme pump/dump). Do not shill or hype.";

const PORTFOLIO_TEMPLATE: &str = "Analyze this crypto portfolio: Total value {total}. \
Top holdings: {holdings}. Give a short, direct assessment (2-4 sentences). \
Highlight risks like concentration or low liquidity.";

const TRENDING_TEMPLATE: &str = "These assets are trending right now:
{entries}

In 2-4 sentences, assess what this list says about current market attention. \
Be analytical and skeptical of hype. Do not recommend buying anything.";

const SIGNALS_TEMPLATE: &str = "Assess a trading signal for {symbol} from these 24h figures:
- Price: {price}
- 24h change: {change}
- 24h high: {high}
- 24h low: {low}
- Position in 24h range: {range_position}
- 24h range width: {range_width}
- 24h volume: {volume}
- Momentum: {momentum}

Answer with exactly these sections, in this order, one or two lines each:
Signal: BUY, SELL or HOLD
Entry zone:
Target:
Stop-loss:
Risk/Reward:
Rationale:
Be analytical, not promotional. Prefer HOLD when the data is inconclusive.";

impl NarrativeKind {
    pub const fn template(self) -> &'static str {
        match self {
            Self::Scan => SCAN_TEMPLATE,
            Self::Portfolio => PORTFOLIO_TEMPLATE,
            Self::Trending => TRENDING_TEMPLATE,
            Self::Signals => SIGNALS_TEMPLATE,
        }
    }
}

/// Named values interpolated into a prompt skeleton
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NarrativeFields(BTreeMap<String, String>);

impl NarrativeFields {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Leaves the field unset when `value` is `None`
    #[must_use]
    pub fn with_opt(self, key: &str, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Substitute every `{key}` in one pass; substituted values are never re-expanded
pub fn render_prompt(template: &str, fields: &NarrativeFields) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_placeholder(&after[..close]) => {
                out.push_str(fields.get(&after[..close]).unwrap_or(MISSING_FIELD));
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_placeholder(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Generates narratives from a provider with fixed generation options
pub struct NarrativeClient {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
}

impl NarrativeClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            options: GenerationOptions::default(),
        }
    }

    /// Use a specific model instead of the default
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn options_for(&self, kind: NarrativeKind) -> GenerationOptions {
        match kind {
            NarrativeKind::Signals => self.options.clone().with_max_tokens(SIGNALS_MAX_TOKENS),
            _ => self.options.clone(),
        }
    }

    /// Render the skeleton for `kind` and ask the provider for commentary
    pub async fn generate(
        &self,
        kind: NarrativeKind,
        fields: &NarrativeFields,
    ) -> Result<Narrative, LlmError> {
        let prompt = render_prompt(kind.template(), fields);
        let messages = [Message::system(SYSTEM_PROMPT), Message::user(prompt)];

        let completion = self
            .provider
            .complete(&messages, &self.options_for(kind))
            .await?;

        if completion.is_truncated() {
            tracing::warn!(?kind, model = %completion.model, "Narrative hit the token limit");
        }
        if let Some(usage) = &completion.usage {
            tracing::debug!(
                ?kind,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Narrative generated"
            );
        }

        let text = completion.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }

        Ok(Narrative {
            text: text.to_string(),
            source_command: kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    #[test]
    fn test_render_substitutes_and_marks_missing() {
        let fields = NarrativeFields::new()
            .with("symbol", "BTC")
            .with_opt("price", Some("$65,000.00".into()))
            .with_opt("change", None);

        let rendered = render_prompt("{symbol} at {price}, {change} today", &fields);
        assert_eq!(rendered, "BTC at $65,000.00, N/A today");
    }

    #[test]
    fn test_render_single_pass() {
        let fields = NarrativeFields::new().with("a", "{b}").with("b", "nope");
        assert_eq!(render_prompt("x {a} y", &fields), "x {b} y");
    }

    #[test]
    fn test_render_keeps_non_placeholder_braces() {
        let fields = NarrativeFields::new();
        assert_eq!(render_prompt("{ not a key } and {", &fields), "{ not a key } and {");
    }

    #[test]
    fn test_every_template_renders_without_braces_left() {
        for kind in [
            NarrativeKind::Scan,
            NarrativeKind::Portfolio,
            NarrativeKind::Trending,
            NarrativeKind::Signals,
        ] {
            let rendered = render_prompt(kind.template(), &NarrativeFields::new());
            assert!(!rendered.contains('{'), "{kind:?} left a placeholder");
        }
    }

    #[test]
    fn test_signals_template_section_order() {
        let template = NarrativeKind::Signals.template();
        let positions: Vec<usize> = ["Signal:", "Entry zone:", "Target:", "Stop-loss:", "Risk/Reward:", "Rationale:"]
            .iter()
            .map(|s| template.find(s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_generate_trims_and_tags() {
        let provider = Arc::new(ScriptedProvider::replying("  Overextended after a 40% pump.  \n"));
        let client = NarrativeClient::new(provider.clone());

        let fields = NarrativeFields::new().with("symbol", "PEPE");
        let narrative = client.generate(NarrativeKind::Scan, &fields).await.unwrap();

        assert_eq!(narrative.text, "Overextended after a 40% pump.");
        assert_eq!(narrative.source_command, NarrativeKind::Scan);

        let prompts = provider.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("(PEPE)"));
        assert!(prompts[0].contains("Current price: N/A"));
    }

    #[tokio::test]
    async fn test_blank_completion_is_failure() {
        let client = NarrativeClient::new(Arc::new(ScriptedProvider::replying(" \n ")));
        let err = client
            .generate(NarrativeKind::Trending, &NarrativeFields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let client = NarrativeClient::new(Arc::new(ScriptedProvider::failing()));
        assert!(client
            .generate(NarrativeKind::Portfolio, &NarrativeFields::new())
            .await
            .is_err());
    }

    #[test]
    fn test_signals_get_larger_budget() {
        let client = NarrativeClient::new(Arc::new(ScriptedProvider::replying("ok")))
            .with_model("llama3.2");

        assert_eq!(client.options_for(NarrativeKind::Scan).max_tokens, 150);
        assert_eq!(client.options_for(NarrativeKind::Signals).max_tokens, 350);
        assert_eq!(client.options_for(NarrativeKind::Signals).model, "llama3.2");
    }
}
