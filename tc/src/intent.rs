//! Origin/destination extraction from free text

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, ToolDefinition};
use crate::prompts::PromptLoader;

/// Name of the tool the model calls with the extracted endpoints
pub const EXTRACT_PLACES_TOOL: &str = "extract_places";

/// What could be pulled out of a user message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// Text the model addressed to the user, typically a clarifying question
    pub reply: Option<String>,
}

/// Extracts trip endpoints from a user message
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Intent, LlmError>;
}

#[derive(Debug, Default, Deserialize)]
struct ExtractPlacesArgs {
    origin: Option<String>,
    destination: Option<String>,
}

/// Intent extraction via a single tool-calling completion
pub struct LlmIntentExtractor {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmIntentExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, config: &LlmConfig) -> Self {
        Self {
            llm,
            prompts,
            max_tokens: config.max_tokens,
            temperature: config.intent_temperature,
        }
    }

    fn tool() -> ToolDefinition {
        ToolDefinition::new(
            EXTRACT_PLACES_TOOL,
            "Extract origin and destination from user input. Values may be null if not found.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "origin": {"type": ["string", "null"], "description": "Where the trip starts"},
                    "destination": {"type": ["string", "null"], "description": "Where the trip ends"}
                }
            }),
        )
    }
}

#[async_trait]
impl IntentExtractor for LlmIntentExtractor {
    async fn extract(&self, text: &str) -> Result<Intent, LlmError> {
        debug!(text_len = text.len(), "extract: called");
        let system_prompt = self
            .prompts
            .render("gather", &serde_json::json!({}))
            .map_err(|e| LlmError::Config(e.to_string()))?;

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(text)],
            tools: vec![Self::tool()],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        let response = self.llm.complete(request).await?;
        let reply = response.text().map(str::to_string);

        let Some(call) = response.tool_calls.iter().find(|c| c.name == EXTRACT_PLACES_TOOL) else {
            debug!(has_reply = reply.is_some(), "extract: no tool call");
            return Ok(Intent {
                reply,
                ..Default::default()
            });
        };

        let args: ExtractPlacesArgs = serde_json::from_value(call.input.clone()).unwrap_or_default();
        let intent = Intent {
            origin: clean(args.origin),
            destination: clean(args.destination),
            reply,
        };
        debug!(?intent.origin, ?intent.destination, "extract: tool call parsed");
        Ok(intent)
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, StopReason, TokenUsage, ToolCall};

    fn extractor(mock: Arc<MockLlmClient>) -> LlmIntentExtractor {
        LlmIntentExtractor::new(mock, Arc::new(PromptLoader::embedded_only()), &LlmConfig::default())
    }

    fn tool_response(input: serde_json::Value, content: Option<&str>) -> CompletionResponse {
        CompletionResponse {
            content: content.map(str::to_string),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: EXTRACT_PLACES_TOOL.to_string(),
                input,
            }],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    #[tokio::test]
    async fn test_extract_from_tool_call() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(tool_response(
            serde_json::json!({"origin": "Chicago", "destination": "Nashville"}),
            None,
        ))]));

        let intent = extractor(mock.clone()).extract("from Chicago to Nashville").await.unwrap();
        assert_eq!(intent.origin.as_deref(), Some("Chicago"));
        assert_eq!(intent.destination.as_deref(), Some("Nashville"));
        assert_eq!(intent.reply, None);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools[0].name, EXTRACT_PLACES_TOOL);
        assert_eq!(requests[0].temperature, Some(0.2));
        assert!(requests[0].system_prompt.contains("extract_places"));
        assert_eq!(requests[0].messages[0].content, "from Chicago to Nashville");
    }

    #[tokio::test]
    async fn test_extract_partial_tool_call() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(tool_response(
            serde_json::json!({"origin": "Chicago", "destination": null}),
            Some("Where would you like to go from Chicago?"),
        ))]));

        let intent = extractor(mock).extract("leaving Chicago").await.unwrap();
        assert_eq!(intent.origin.as_deref(), Some("Chicago"));
        assert_eq!(intent.destination, None);
        assert_eq!(intent.reply.as_deref(), Some("Where would you like to go from Chicago?"));
    }

    #[tokio::test]
    async fn test_extract_plain_reply() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(text_response(
            "  Hi, please provide an origin and destination.  ",
        ))]));

        let intent = extractor(mock).extract("Hi").await.unwrap();
        assert_eq!(
            intent,
            Intent {
                origin: None,
                destination: None,
                reply: Some("Hi, please provide an origin and destination.".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_extract_blank_values_are_none() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(tool_response(
            serde_json::json!({"origin": "  ", "destination": ""}),
            None,
        ))]));

        let intent = extractor(mock).extract("somewhere").await.unwrap();
        assert_eq!(intent, Intent::default());
    }

    #[tokio::test]
    async fn test_extract_propagates_llm_error() {
        let mock = Arc::new(MockLlmClient::new(vec![Err(LlmError::InvalidResponse("bad".to_string()))]));
        assert!(extractor(mock).extract("x").await.is_err());
    }
}
