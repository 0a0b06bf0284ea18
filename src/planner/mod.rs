//! Turning a user query into an [`ExecutionPlan`].
//!
//! [`Planner::plan`] returns the completion text untouched; callers run it
//! through [`normalize`] and [`ExecutionPlan::parse`].

use std::sync::Arc;

use crate::llm::types::{ChatCompletionRequest, ChatMessage};
use crate::llm::{LlmError, LlmProvider};

pub mod normalize;
pub mod plan;
pub mod prompt;

pub use normalize::normalize;
pub use plan::ExecutionPlan;
pub use prompt::{PromptError, PromptTemplate, DEFAULT_PROMPT_LIMIT};

pub struct Planner {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
}

impl Planner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// One completion request, no retry.
    pub async fn plan(&self, query: &str) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(query),
            ],
            temperature: None,
            max_tokens: None,
            stream: false,
        };

        let response = self.provider.chat_completion(request).await?;
        tracing::debug!(
            provider = self.provider.id(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "planner response received"
        );
        Ok(response.content)
    }
}
