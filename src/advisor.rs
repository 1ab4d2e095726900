use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::{AdvisorSettings, ContextBuilder};
use crate::error::{AdvisorError, Result};
use crate::llm::ChatModel;
use crate::prompt::build_prompt;
use crate::schema::UserType;
use crate::tools::Toolbox;

pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm sorry, I couldn't put together an answer right now. Please try rephrasing your question.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_type: UserType,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
}

/// Answers customer questions with their financial data in the prompt.
#[derive(Clone)]
pub struct ChatAdvisor {
    context: ContextBuilder,
    model: Arc<dyn ChatModel>,
}

impl ChatAdvisor {
    pub fn new(toolbox: Toolbox, model: Arc<dyn ChatModel>) -> Self {
        Self::with_settings(toolbox, model, AdvisorSettings::default())
    }

    pub fn with_settings(
        toolbox: Toolbox,
        model: Arc<dyn ChatModel>,
        settings: AdvisorSettings,
    ) -> Self {
        Self {
            context: ContextBuilder::new(toolbox, settings),
            model,
        }
    }

    pub async fn respond(&self, request: &ChatRequest) -> Result<ChatReply> {
        if request.message.trim().is_empty() {
            return Err(AdvisorError::InvalidRequest("message is required".to_string()));
        }

        let context = self
            .context
            .build(request.user_type, &request.user_id)
            .await;
        info!(
            "Answering {} {} with {:?} context",
            request.user_type, request.user_id, context.mode
        );

        let prompt = build_prompt(
            request.user_type,
            &request.user_id,
            &context,
            &request.message,
        );
        let text = self.model.generate(&prompt).await?;

        let response = if text.trim().is_empty() {
            warn!("Model returned an empty reply");
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            text.trim().to_string()
        };
        Ok(ChatReply { response })
    }
}
