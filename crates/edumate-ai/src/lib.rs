//! edumate-ai: Generative-AI providers.
//!
//! Implements the `AiProvider` trait for Google Gemini and OpenAI-compatible
//! APIs, plus a scriptable mock, and loads provider configuration.

pub mod config;
pub mod error;
pub mod gemini;
mod http;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, EdumateConfig, ProviderConfig};
pub use error::AiError;
