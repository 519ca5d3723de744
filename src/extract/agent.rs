//! Typed-result agent
//!
//! The agent forces the model to answer through a `final_result` tool whose
//! arguments follow the result type's schema. Arguments that fail validation
//! are sent back to the model as the tool's reply so it can correct them.

use crate::error::{RecordForgeError, Result};
use crate::llm::{GenerationParams, LLMProvider, LLMResponse, Message, ToolChoice, ToolDefinition};
use crate::schema::Model;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// Name of the tool the model answers through
pub const FINAL_RESULT_TOOL: &str = "final_result";

const DEFAULT_RESULT_RETRIES: u32 = 1;

const FINAL_RESULT_DESCRIPTION: &str = "The final response which ends this conversation";

const PLAIN_TEXT_NUDGE: &str =
    "Plain text responses are not permitted, please call one of the functions instead.";

/// Token accounting across every request of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub requests: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    fn record(&mut self, response: &LLMResponse) {
        self.requests += 1;
        self.input_tokens += response.input_tokens.unwrap_or(0);
        self.output_tokens += response.output_tokens.unwrap_or(0);
        self.total_tokens += response.get_total_tokens().unwrap_or(0);
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunResult<M> {
    /// The validated result
    pub data: M,
    messages: Vec<Message>,
    usage: Usage,
}

impl<M> RunResult<M> {
    /// Every message exchanged, including retries
    pub fn all_messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }
}

/// Agent returning a validated `M`
pub struct Agent<P, M> {
    provider: P,
    system_prompt: String,
    max_result_retries: u32,
    params: GenerationParams,
    _result: PhantomData<fn() -> M>,
}

impl<P: LLMProvider, M: Model> Agent<P, M> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            system_prompt: String::new(),
            max_result_retries: DEFAULT_RESULT_RETRIES,
            params: GenerationParams::default(),
            _result: PhantomData,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Extra attempts allowed after an invalid or missing result
    pub fn with_max_result_retries(mut self, retries: u32) -> Self {
        self.max_result_retries = retries;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn result_tool() -> ToolDefinition {
        let mut tool = ToolDefinition::named(FINAL_RESULT_TOOL, &M::schema());
        if tool.description.is_none() {
            tool.description = Some(FINAL_RESULT_DESCRIPTION.to_string());
        }
        tool
    }

    /// Run the agent on one user prompt
    pub async fn run(&self, prompt: &str) -> Result<RunResult<M>> {
        let params = self
            .params
            .clone()
            .with_tool(Self::result_tool())
            .with_tool_choice(ToolChoice::Required);

        let mut messages = Vec::new();
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(&self.system_prompt));
        }
        messages.push(Message::user(prompt));

        let mut usage = Usage::default();
        let mut retries = 0;

        loop {
            info!(
                provider = self.provider.provider_name(),
                attempt = retries + 1,
                "running agent"
            );
            let response = self.provider.generate(&messages, Some(&params)).await?;
            usage.record(&response);

            let Some(call) = response
                .tool_calls
                .iter()
                .find(|call| call.name == FINAL_RESULT_TOOL)
                .cloned()
            else {
                messages.push(Message::assistant(response.content.clone()));
                if retries >= self.max_result_retries {
                    return Err(RecordForgeError::Extraction(format!(
                        "model did not call {} after {} attempts",
                        FINAL_RESULT_TOOL,
                        retries + 1
                    )));
                }
                retries += 1;
                warn!("model replied with plain text, asking for a tool call");
                messages.push(Message::user(PLAIN_TEXT_NUDGE));
                continue;
            };

            messages.push(Message::assistant_with_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            // Every call in an assistant turn needs an answer before the next request
            for other in response.tool_calls.iter().filter(|c| c.id != call.id) {
                messages.push(Message::tool(&other.id, "Tool not executed"));
            }

            match M::model_validate_json(&call.arguments) {
                Ok(data) => {
                    debug!(requests = usage.requests, "agent produced a valid result");
                    messages.push(Message::tool(&call.id, "Final result processed."));
                    return Ok(RunResult {
                        data,
                        messages,
                        usage,
                    });
                }
                Err(err) => {
                    if retries >= self.max_result_retries {
                        return Err(err.into());
                    }
                    retries += 1;
                    warn!(errors = err.error_count(), "result failed validation, retrying");
                    messages.push(Message::tool(
                        &call.id,
                        format!("{}\n\nFix the errors and try again.", err),
                    ));
                }
            }
        }
    }
}
