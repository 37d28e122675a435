/// LLM Client: the single point of entry for all Claude API calls in Rebound.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// There is no retry policy: a failed call is reported once and the caller
/// decides whether to resubmit.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all extraction calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Thin wrapper over the Anthropic Messages API with structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: ANTHROPIC_API_URL.to_string(),
            timeout,
        })
    }

    /// Points the client at a different Messages endpoint (a proxy or a local stub).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Makes a single call to the Claude API with one user-role message,
    /// returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Http(e)
            }
        })?;
        let llm_response: LlmResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(llm_response)
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let response = self.call(prompt).await?;
        parse_json_reply(&response)
    }
}

/// Takes the first text block of a reply, strips code fences and parses it as JSON.
pub fn parse_json_reply<T: DeserializeOwned>(response: &LlmResponse) -> Result<T, LlmError> {
    let text = response.text().ok_or(LlmError::EmptyContent)?;
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(blocks: serde_json::Value) -> LlmResponse {
        serde_json::from_value(serde_json::json!({ "content": blocks })).unwrap()
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_text_skips_non_text_blocks() {
        let response = response_with(serde_json::json!([
            {"type": "tool_use"},
            {"type": "text", "text": "hello"}
        ]));
        assert_eq!(response.text(), Some("hello"));
    }

    #[test]
    fn test_parse_json_reply_fenced() {
        let response = response_with(serde_json::json!([
            {"type": "text", "text": "```json\n{\"a\": 1}\n```"}
        ]));
        let value: serde_json::Value = parse_json_reply(&response).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_parse_json_reply_without_text_is_empty_content() {
        let response = response_with(serde_json::json!([]));
        let result: Result<serde_json::Value, _> = parse_json_reply(&response);
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_parse_json_reply_prose_is_parse_error() {
        let response = response_with(serde_json::json!([
            {"type": "text", "text": "Sure! Here is the JSON you asked for."}
        ]));
        let result: Result<serde_json::Value, _> = parse_json_reply(&response);
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_request_shape() {
        let request = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["model"], MODEL);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_call_maps_error_status_and_provider_message() {
        let endpoint = stub::serve(
            529,
            serde_json::json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            }),
            Duration::ZERO,
        )
        .await;
        let client = LlmClient::new("test-key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_endpoint(endpoint);

        match client.call("hi").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 529);
                assert_eq!(message, "Overloaded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_keeps_raw_body_when_error_is_not_json() {
        let endpoint = stub::serve_text(500, "upstream exploded", Duration::ZERO).await;
        let client = LlmClient::new("test-key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_endpoint(endpoint);

        match client.call("hi").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_reply_is_timeout() {
        let endpoint = stub::serve(
            200,
            serde_json::json!({"content": [{"type": "text", "text": "{}"}]}),
            Duration::from_secs(2),
        )
        .await;
        let client = LlmClient::new("test-key".to_string(), Duration::from_millis(100))
            .unwrap()
            .with_endpoint(endpoint);

        let err = client.call("hi").await.unwrap_err();
        assert!(
            matches!(err, LlmError::Timeout(d) if d == Duration::from_millis(100)),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_call_json_parses_fenced_reply() {
        let endpoint = stub::serve(
            200,
            serde_json::json!({
                "content": [{"type": "text", "text": "```json\n{\"a\": 1}\n```"}],
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }),
            Duration::ZERO,
        )
        .await;
        let client = LlmClient::new("test-key".to_string(), Duration::from_secs(5))
            .unwrap()
            .with_endpoint(endpoint);

        let value: serde_json::Value = client.call_json("hi").await.unwrap();
        assert_eq!(value["a"], 1);
    }
}
