//! Test doubles shared by the unit tests of this crate

use async_trait::async_trait;
use cyntel_core::provider::FinishReason;
use cyntel_core::{Completion, GenerationOptions, LlmError, LlmProvider, Message, Role};
use tokio::sync::Mutex;

/// LLM provider answering every request with the same reply
pub struct ScriptedProvider {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every completion fails as if the provider were down
    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// User prompts received so far
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> cyntel_core::Result<bool> {
        Ok(self.reply.is_some())
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> cyntel_core::Result<Completion> {
        let mut prompts = self.prompts.lock().await;
        prompts.extend(
            messages
                .iter()
                .filter(|m| m.role == Role::User)
                .map(|m| m.content.clone()),
        );

        let content = self
            .reply
            .clone()
            .ok_or_else(|| LlmError::ProviderUnavailable("scripted outage".into()))?;

        Ok(Completion {
            content,
            model: options.model.clone(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        })
    }
}
