//! # cyntel-runtime
//!
//! Runtime LLM providers for the cyntel narrative layer.
//!
//! ## Providers
//!
//! - **OpenAI** (default): chat completions over HTTPS
//! - **Ollama**: local LLM inference via Ollama
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cyntel_runtime::OpenAiProvider;
//!
//! let provider = Arc::new(OpenAiProvider::from_env()?);
//! let narrator = NarrativeClient::new(provider).with_model("gpt-4o-mini");
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use cyntel_core::{GenerationOptions, LlmError, LlmProvider, Message, Result, Role};
