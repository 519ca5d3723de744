//! OpenAI API Provider
//!
//! This module implements the LLMProvider trait for OpenAI's chat
//! completions API, including function tools and tool calls.

use crate::error::{RecordForgeError, Result};
use crate::llm::client::LLMHttpClient;
use crate::llm::provider::{
    GenerationParams, LLMProvider, LLMProviderBuilder, LLMResponse, Message, MessageRole,
    ToolCall, ToolChoice, ToolDefinition,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// OpenAI API base URL
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI GPT API provider
pub struct OpenAIProvider {
    /// API key for authentication
    api_key: String,
    /// Model to use (e.g., "gpt-4o")
    model: String,
    /// API base URL, without the `/chat/completions` suffix
    base_url: String,
    /// HTTP client for making requests
    client: LLMHttpClient,
    /// Maximum tokens for generation
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `model` - Model identifier (defaults to gpt-4o)
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: OPENAI_API_BASE.to_string(),
            client: LLMHttpClient::new()?,
            max_tokens: 4096,
        })
    }

    /// Create a provider from builder settings
    pub fn from_builder(builder: &LLMProviderBuilder) -> Result<Self> {
        let api_key = builder
            .get_api_key()
            .ok_or_else(|| RecordForgeError::LLMApiKeyMissing("OpenAI".to_string()))?;
        let mut provider = Self::new(api_key, builder.get_model().map(str::to_string))?;
        provider.client = LLMHttpClient::with_timeout(builder.get_timeout())?;
        if let Some(base_url) = builder.get_base_url() {
            provider = provider.with_base_url(base_url);
        }
        Ok(provider)
    }

    /// Set the maximum tokens for generation
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Point at an OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert our Message format to OpenAI format
    fn convert_messages_to_openai(&self, messages: &[Message]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::System => "system",
                    MessageRole::Tool => "tool",
                }
                .to_string(),
                // Assistant turns that only call tools carry null content
                content: if msg.content.is_empty() && !msg.tool_calls.is_empty() {
                    None
                } else {
                    Some(msg.content.clone())
                },
                tool_calls: (!msg.tool_calls.is_empty()).then(|| {
                    msg.tool_calls
                        .iter()
                        .map(|call| OpenAIToolCall {
                            id: call.id.clone(),
                            kind: "function".to_string(),
                            function: OpenAIFunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: msg.tool_call_id.clone(),
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Option<Vec<OpenAITool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|tool| OpenAITool {
                    kind: "function".to_string(),
                    function: OpenAIFunction {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
        )
    }

    fn convert_tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::Required => json!("required"),
            ToolChoice::Function(name) => json!({
                "type": "function",
                "function": {"name": name}
            }),
        }
    }

    fn build_request(&self, messages: &[Message], params: Option<&GenerationParams>) -> OpenAIRequest {
        let max_tokens = params
            .and_then(|p| p.max_tokens)
            .unwrap_or(self.max_tokens);
        let temperature: f32 = params.and_then(|p| p.temperature).unwrap_or(0.7);

        OpenAIRequest {
            model: self.model.clone(),
            messages: self.convert_messages_to_openai(messages),
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
            top_p: params.and_then(|p| p.top_p),
            stop: params.and_then(|p| p.stop_sequences.clone()),
            tools: params.and_then(|p| Self::convert_tools(&p.tools)),
            tool_choice: params
                .and_then(|p| p.tool_choice.as_ref())
                .map(Self::convert_tool_choice),
        }
    }

    /// Parse a chat completions response body
    fn parse_response(&self, response_text: &str) -> Result<LLMResponse> {
        let openai_response: OpenAIResponse =
            serde_json::from_str(response_text).map_err(|e| RecordForgeError::LLMApiError {
                provider: "OpenAI".to_string(),
                message: format!("Failed to parse response: {}", e),
                status: 0,
            })?;

        let choice = openai_response.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let (content, tool_calls) = match choice {
            Some(choice) => (
                choice.message.content.unwrap_or_default(),
                choice
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolCall {
                        id: call.id,
                        name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            model: Some(openai_response.model),
            input_tokens: openai_response.usage.as_ref().map(|u| u.prompt_tokens),
            output_tokens: openai_response.usage.as_ref().map(|u| u.completion_tokens),
            total_tokens: openai_response.usage.as_ref().map(|u| u.total_tokens),
            finish_reason,
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    /// Generate a response from the chat completions API
    async fn generate(
        &self,
        messages: &[Message],
        params: Option<&GenerationParams>,
    ) -> Result<LLMResponse> {
        self.validate_config()?;

        let request = self.build_request(messages, params);
        let headers = LLMHttpClient::build_headers(&self.api_key)?;
        let response_text = self
            .client
            .post_with_retry("OpenAI", &self.endpoint(), headers, &request)
            .await?;

        let response = self.parse_response(&response_text)?;
        debug!(
            model = ?response.model,
            finish_reason = ?response.finish_reason,
            tool_calls = response.tool_calls.len(),
            total_tokens = ?response.get_total_tokens(),
            "OpenAI response received"
        );
        Ok(response)
    }

    /// Get provider name
    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    /// Check if API key is set
    fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

/// OpenAI API message format
#[derive(Debug, Serialize, Clone)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Function tool offered in a request
#[derive(Debug, Serialize, Clone)]
struct OpenAITool {
    #[serde(rename = "type")]
    kind: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize, Clone)]
struct OpenAIFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: Value,
}

/// Tool call, both in responses and echoed back in history
#[derive(Debug, Serialize, Deserialize, Clone)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAIFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

/// Choice in OpenAI response
#[derive(Debug, Deserialize, Clone)]
struct Choice {
    message: OpenAIMessageResponse,
    finish_reason: Option<String>,
}

/// Message in OpenAI response
#[derive(Debug, Deserialize, Clone)]
struct OpenAIMessageResponse {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

/// Token usage information
#[derive(Debug, Deserialize, Clone)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
