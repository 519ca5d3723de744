//! LLM Provider Trait
//!
//! This module defines the trait-based abstraction for completion services,
//! including the tool (function) definitions used to ask a model for
//! structured output.

use crate::error::{RecordForgeError, Result};
use crate::schema::Schema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LLM message role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageRole {
    /// System message (sets behavior/context)
    System,
    /// User message (query or input)
    User,
    /// Assistant message (response)
    Assistant,
    /// Result of a tool call, answering an assistant message
    Tool,
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call identifier
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Arguments as JSON text
    pub arguments: String,
}

/// LLM message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// Tool calls made by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call answered by a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Assistant message that made tool calls
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(MessageRole::Assistant, content)
        }
    }

    /// Tool message answering `tool_call_id`
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(MessageRole::Tool, content)
        }
    }
}

/// A function the model may call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema of the arguments
    pub parameters: Value,
}

impl ToolDefinition {
    /// Tool named after the schema title, described by its docstring
    pub fn from_schema(schema: &Schema) -> Self {
        Self::named(schema.title(), schema)
    }

    /// Tool with an explicit name whose arguments follow `schema`
    pub fn named(name: impl Into<String>, schema: &Schema) -> Self {
        Self {
            name: name.into(),
            description: schema.description().map(str::to_string),
            parameters: schema.json_schema(),
        }
    }
}

/// How the model may use the offered tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolChoice {
    /// Model decides
    Auto,
    /// Model must call some tool
    Required,
    /// Model must call the named tool
    Function(String),
}

/// LLM response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Generated text content
    pub content: String,
    /// Tool calls requested by the model
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Number of tokens used (input)
    pub input_tokens: Option<u32>,
    /// Number of tokens used (output)
    pub output_tokens: Option<u32>,
    /// Total tokens used
    pub total_tokens: Option<u32>,
    /// Model used for generation
    pub model: Option<String>,
    /// Finish reason (e.g., "stop", "tool_calls")
    pub finish_reason: Option<String>,
}

impl LLMResponse {
    /// Create a new response
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            input_tokens: None,
            output_tokens: None,
            total_tokens: None,
            model: None,
            finish_reason: None,
        }
    }

    /// Response carrying tool calls and no text
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            finish_reason: Some("tool_calls".to_string()),
            ..Self::new("")
        }
    }

    /// Get total token count if available
    pub fn get_total_tokens(&self) -> Option<u32> {
        self.total_tokens.or_else(|| {
            self.input_tokens
                .and_then(|input| self.output_tokens.map(|output| input + output))
        })
    }

    /// First tool call, if any
    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        self.tool_calls.first()
    }
}

/// LLM generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 1.0, higher = more random)
    pub temperature: Option<f32>,
    /// Top-p sampling (0.0 - 1.0)
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
    /// Tools offered to the model
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    /// Tool usage policy; provider default when unset
    pub tool_choice: Option<ToolChoice>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.7),
            top_p: Some(1.0),
            stop_sequences: None,
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

impl GenerationParams {
    /// Create new default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Offer a tool
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set the tool usage policy
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }
}

/// Trait for LLM providers
///
/// This trait defines the interface that all completion services must
/// implement. Extractors are generic over it so tests can script replies.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a response from the LLM
    ///
    /// # Arguments
    /// * `messages` - Conversation history
    /// * `params` - Generation parameters, including offered tools
    ///
    /// # Returns
    /// The LLM response
    async fn generate(
        &self,
        messages: &[Message],
        params: Option<&GenerationParams>,
    ) -> Result<LLMResponse>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Check if the provider has an API key configured
    fn has_api_key(&self) -> bool;

    /// Validate the provider configuration
    fn validate_config(&self) -> Result<()> {
        if !self.has_api_key() {
            return Err(RecordForgeError::LLMApiKeyMissing(
                self.provider_name().to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Box<T> {
    async fn generate(
        &self,
        messages: &[Message],
        params: Option<&GenerationParams>,
    ) -> Result<LLMResponse> {
        (**self).generate(messages, params).await
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }

    fn has_api_key(&self) -> bool {
        (**self).has_api_key()
    }
}

/// Builder for creating LLM providers
pub struct LLMProviderBuilder {
    /// API key for the provider
    api_key: Option<String>,
    /// Base URL for API requests (for custom endpoints)
    base_url: Option<String>,
    /// Model to use
    model: Option<String>,
    /// Timeout for requests (in seconds)
    timeout: u64,
}

impl Default for LLMProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            timeout: 60,
        }
    }
}

impl LLMProviderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the API key
    pub fn get_api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Get the base URL
    pub fn get_base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Get the model
    pub fn get_model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get the timeout
    pub fn get_timeout(&self) -> u64 {
        self.timeout
    }
}
