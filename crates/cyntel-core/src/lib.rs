//! # cyntel-core
//!
//! Provider-agnostic LLM abstraction used to generate market narratives.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    NarrativeClient                           │
//! │  ┌─────────────────┐        ┌─────────────────────────────┐ │
//! │  │ Prompt template │──────▶│  LlmProvider (Strategy)     │ │
//! │  └─────────────────┘        │  OpenAI │ Ollama │ test     │ │
//! │                             └─────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, Ollama, or a
//! scripted test double without changing the command pipeline.

pub mod error;
pub mod message;
pub mod provider;

pub use error::{LlmError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
