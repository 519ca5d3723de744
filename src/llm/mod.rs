//! LLM integration module
//!
//! This module provides the trait-based completion-service abstraction
//! and its OpenAI implementation.

pub mod client;
pub mod provider;

// Provider implementations
pub mod providers {
    pub mod openai;
}

// Re-exports
pub use provider::{
    GenerationParams, LLMProvider, LLMProviderBuilder, LLMResponse, Message, MessageRole,
    ToolCall, ToolChoice, ToolDefinition,
};
