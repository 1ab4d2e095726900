#[cfg(feature = "gemini")]
pub mod client;
#[cfg(feature = "gemini")]
pub mod types;

#[cfg(feature = "gemini")]
pub use client::*;

use async_trait::async_trait;

use crate::error::Result;

/// A hosted text-generation model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
