//! Structured extraction
//!
//! An [`Extractor`] turns a prompt into raw field values for a schema by
//! asking a completion service. The raw values then go through the same
//! validation as any other input.

pub mod agent;

use crate::error::{RecordForgeError, Result};
use crate::llm::{GenerationParams, LLMProvider, Message, ToolChoice, ToolDefinition};
use crate::schema::{Model, Schema};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

pub use agent::{Agent, RunResult, Usage};

/// Produces raw field values for a schema from natural language
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Ask for values matching `schema`; the result is not yet validated
    async fn extract_raw(&self, schema: &Schema, system_prompt: &str, prompt: &str)
        -> Result<Value>;

    /// Extract and validate a record
    async fn extract<M>(&self, system_prompt: &str, prompt: &str) -> Result<M>
    where
        M: Model + Send,
        Self: Sized,
    {
        let raw = self.extract_raw(&M::schema(), system_prompt, prompt).await?;
        Ok(M::model_validate(&raw)?)
    }
}

/// Single request offering one function tool built from the schema.
///
/// The tool is named after the schema title and described by its
/// description; the first tool call's arguments are the raw values.
pub struct ToolCallExtractor<P> {
    provider: P,
    params: GenerationParams,
    force_tool: bool,
}

impl<P: LLMProvider> ToolCallExtractor<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            params: GenerationParams::default(),
            force_tool: true,
        }
    }

    /// Base generation parameters; tools are added per request
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Let the model decide whether to call the tool
    pub fn with_auto_tool_choice(mut self) -> Self {
        self.force_tool = false;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: LLMProvider> Extractor for ToolCallExtractor<P> {
    async fn extract_raw(
        &self,
        schema: &Schema,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<Value> {
        let tool = ToolDefinition::from_schema(schema);
        let choice = if self.force_tool {
            ToolChoice::Function(tool.name.clone())
        } else {
            ToolChoice::Auto
        };
        let params = self.params.clone().with_tool(tool).with_tool_choice(choice);

        let messages = vec![Message::system(system_prompt), Message::user(prompt)];
        info!(
            provider = self.provider.provider_name(),
            schema = schema.title(),
            "requesting structured extraction"
        );
        let response = self.provider.generate(&messages, Some(&params)).await?;

        let call = response.first_tool_call().ok_or_else(|| {
            RecordForgeError::Extraction(format!(
                "model replied without calling {}: {}",
                schema.title(),
                response.content
            ))
        })?;
        debug!(tool = %call.name, arguments = %call.arguments, "tool call received");

        Ok(schema.parse_json(&call.arguments)?)
    }
}
