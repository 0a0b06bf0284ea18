//! Completion-service client layer.
//!
//! The planner talks to the completion service through [`LlmProvider`];
//! [`OpenAiProvider`] speaks the OpenAI-compatible chat-completions wire
//! format used by DeepSeek and most hosted models.

use async_trait::async_trait;

pub mod error;
pub mod provider;
pub mod types;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;
    fn info(&self) -> types::ProviderInfo;

    async fn chat_completion(
        &self,
        request: types::ChatCompletionRequest,
    ) -> Result<types::ChatCompletionResponse, error::LlmError>;
}

pub use error::LlmError;
pub use provider::{OpenAiConfig, OpenAiProvider};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, ProviderInfo, TokenUsage,
};
