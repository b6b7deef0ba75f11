//! Conversational rewrite of the itinerary text

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::PromptLoader;

/// Turns a formatted itinerary into a reply for the user
#[async_trait]
pub trait ReplyComposer: Send + Sync {
    /// Composed reply; `Ok(None)` when the composer produced nothing usable
    async fn compose(&self, itinerary: &str) -> Result<Option<String>, LlmError>;
}

/// Reply composition via the `reply` prompt template
pub struct LlmReplyComposer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmReplyComposer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, config: &LlmConfig) -> Self {
        Self {
            llm,
            prompts,
            max_tokens: config.max_tokens,
            temperature: config.reply_temperature,
        }
    }
}

#[async_trait]
impl ReplyComposer for LlmReplyComposer {
    async fn compose(&self, itinerary: &str) -> Result<Option<String>, LlmError> {
        debug!(itinerary_len = itinerary.len(), "compose: called");
        let prompt = self
            .prompts
            .render("reply", &serde_json::json!({ "itinerary": itinerary }))
            .map_err(|e| LlmError::Config(e.to_string()))?;

        let request = CompletionRequest {
            system_prompt: String::new(),
            messages: vec![Message::user(prompt)],
            tools: vec![],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        let response = self.llm.complete(request).await?;
        let reply = response.text().map(str::to_string);
        debug!(has_reply = reply.is_some(), "compose: done");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, StopReason, TokenUsage};

    fn response(text: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    fn composer(mock: Arc<MockLlmClient>) -> LlmReplyComposer {
        LlmReplyComposer::new(mock, Arc::new(PromptLoader::embedded_only()), &LlmConfig::default())
    }

    #[tokio::test]
    async fn test_compose_embeds_itinerary_verbatim() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(response("Sunny all the way!"))]));
        let itinerary = "Trip from Chicago to Nashville:\n  1. Cook County, IL, US: Clear (min 50°, max 70°)";

        let reply = composer(mock.clone()).compose(itinerary).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Sunny all the way!"));

        let requests = mock.requests();
        assert!(requests[0].messages[0].content.contains(itinerary));
        assert_eq!(requests[0].temperature, Some(0.3));
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_compose_blank_output_is_none() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(response("   \n"))]));
        assert_eq!(composer(mock).compose("Trip").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_compose_error() {
        let mock = Arc::new(MockLlmClient::new(vec![Err(LlmError::ApiError {
            status: 500,
            message: "down".to_string(),
        })]));
        assert!(composer(mock).compose("Trip").await.is_err());
    }
}
