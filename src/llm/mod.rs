//! Generative-model integration for sentiment summaries.
//!
//! Defines the `Summarizer` trait and the Gemini implementation.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over a text-in, text-out generative model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Send a complete prompt and return the model's text reply.
    async fn summarize(&self, prompt: &str) -> Result<String>;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}
