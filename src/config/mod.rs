//! Configuration module
//!
//! This module handles configuration management, including API key
//! storage, model selection and construction of the active provider.

pub mod storage;

use crate::error::{RecordForgeError, Result};
use crate::llm::providers::openai::{OpenAIProvider, DEFAULT_MODEL};
use crate::llm::{LLMProvider, LLMProviderBuilder};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Providers this build can construct
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai"];

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the OpenAI endpoint
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// `provider:model` pair, e.g. `openai:gpt-4o`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
}

impl FromStr for ModelSpec {
    type Err = RecordForgeError;

    /// A bare model name is taken to be an OpenAI model
    fn from_str(s: &str) -> Result<Self> {
        let (provider, model) = s.split_once(':').unwrap_or(("openai", s));
        let (provider, model) = (provider.trim(), model.trim());
        if provider.is_empty() || model.is_empty() {
            return Err(RecordForgeError::Config(format!(
                "Invalid model '{}'. Expected <provider>:<model>, e.g. openai:gpt-4o",
                s
            )));
        }
        Ok(Self {
            provider: provider.to_lowercase(),
            model: model.to_string(),
        })
    }
}

/// Application state
pub struct AppState {
    /// LLM provider API keys
    pub api_keys: HashMap<String, String>,
    /// Model configurations for each provider
    pub models: HashMap<String, String>,
    /// Current selected provider
    pub current_provider: Option<String>,
    /// API key taken from the environment
    env_api_key: Option<String>,
    /// Endpoint taken from the environment
    env_base_url: Option<String>,
    /// Whether changes are written back to disk
    persist: bool,
}

impl AppState {
    /// Create a new application state, loading from disk and environment
    pub fn new() -> Self {
        let config = storage::Config::load().unwrap_or_else(|e| {
            debug!(error = %e, "using default configuration");
            storage::Config::default()
        });
        let env = |name: &str| std::env::var(name).ok().filter(|v: &String| !v.is_empty());

        Self {
            api_keys: config.api_keys,
            models: config.models,
            current_provider: config.current_provider,
            env_api_key: env(OPENAI_API_KEY_ENV),
            env_base_url: env(OPENAI_BASE_URL_ENV),
            persist: true,
        }
    }

    /// In-memory state that ignores the environment and never saves
    pub fn ephemeral() -> Self {
        Self {
            api_keys: HashMap::new(),
            models: storage::Config::default_models(),
            current_provider: None,
            env_api_key: None,
            env_base_url: None,
            persist: false,
        }
    }

    /// Point the provider at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.env_base_url = Some(base_url.into());
        self
    }

    /// Select a `provider:model` for this session without saving it
    pub fn select_model(&mut self, spec: &ModelSpec) -> Result<()> {
        let provider = Self::check_provider(&spec.provider)?;
        self.models.insert(provider.clone(), spec.model.clone());
        self.current_provider = Some(provider);
        Ok(())
    }

    /// Store an API key for a provider and save to disk
    pub fn set_api_key(&mut self, provider: String, key: String) -> Result<()> {
        let provider = Self::check_provider(&provider)?;
        self.api_keys.insert(provider.clone(), key);
        if self.current_provider.is_none() {
            self.current_provider = Some(provider);
        }
        self.save()
    }

    /// Get API key for a provider
    pub fn get_api_key(&self, provider: &str) -> Option<&String> {
        self.api_keys.get(provider)
    }

    /// Set model for a provider and save to disk
    pub fn set_model(&mut self, provider: String, model: String) -> Result<()> {
        let provider = Self::check_provider(&provider)?;
        self.models.insert(provider, model);
        self.save()
    }

    /// Get model for a provider
    pub fn get_model(&self, provider: &str) -> Option<String> {
        self.models.get(provider).cloned()
    }

    /// Apply a `provider:model` spec and make that provider current
    pub fn use_model(&mut self, spec: &ModelSpec) -> Result<()> {
        self.select_model(spec)?;
        self.save()
    }

    /// Settings for the current provider; the environment key wins over the stored one
    pub fn provider_builder(&self) -> Result<LLMProviderBuilder> {
        let provider = self
            .current_provider
            .clone()
            .unwrap_or_else(|| "openai".to_string());
        let provider = Self::check_provider(&provider)?;

        let api_key = self
            .env_api_key
            .as_ref()
            .or_else(|| self.api_keys.get(&provider))
            .ok_or_else(|| RecordForgeError::LLMApiKeyMissing(provider.clone()))?;
        let model = self
            .get_model(&provider)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut builder = LLMProviderBuilder::new()
            .with_api_key(api_key)
            .with_model(model);
        if let Some(base_url) = &self.env_base_url {
            builder = builder.with_base_url(base_url);
        }
        Ok(builder)
    }

    /// Construct the current provider
    pub fn build_provider(&self) -> Result<Box<dyn LLMProvider>> {
        let builder = self.provider_builder()?;
        Ok(Box::new(OpenAIProvider::from_builder(&builder)?))
    }

    fn check_provider(provider: &str) -> Result<String> {
        let provider = provider.to_lowercase();
        if SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
            Ok(provider)
        } else {
            Err(RecordForgeError::Config(format!(
                "Unsupported provider '{}'. Supported: {}",
                provider,
                SUPPORTED_PROVIDERS.join(", ")
            )))
        }
    }

    /// Save configuration to disk
    fn save(&self) -> Result<()> {
        if !self.persist {
            return Ok(());
        }
        let config = storage::Config {
            api_keys: self.api_keys.clone(),
            models: self.models.clone(),
            current_provider: self.current_provider.clone(),
        };
        config.save()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application state
pub type SharedState = Arc<RwLock<AppState>>;
