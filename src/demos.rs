//! Named demos
//!
//! Each demo builds or extracts one [`User`] and renders the outcome the way
//! it would be printed. Rejected input surfaces as a validation error.

use crate::error::{RecordForgeError, Result};
use crate::extract::{Agent, Extractor, ToolCallExtractor};
use crate::llm::LLMProvider;
use crate::schema::Model;
use crate::user::User;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// System instruction for the extraction demos
pub const SYSTEM_PROMPT: &str = "Extract information about the user";

/// Natural-language input for the extraction demos
pub const USER_PROMPT: &str = "The user with ID 123 is called Samuel, born on Jan 28th 87";

/// A runnable demo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// Valid literal with string-typed fields that coerce
    Literal,
    /// Literal whose date of birth is a list
    Invalid,
    /// Literal whose date of birth has a three-digit year
    BadDate,
    /// One tool call against the completion service
    OpenAI,
    /// Agent with a typed result
    Agent,
}

impl Demo {
    pub fn all() -> &'static [Demo] {
        &[
            Demo::Literal,
            Demo::Invalid,
            Demo::BadDate,
            Demo::OpenAI,
            Demo::Agent,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Demo::Literal => "literal",
            Demo::Invalid => "invalid",
            Demo::BadDate => "bad-date",
            Demo::OpenAI => "openai",
            Demo::Agent => "agent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Demo::Literal => "Validate a literal with string id and ISO date",
            Demo::Invalid => "Validate a literal whose dob is a list (fails)",
            Demo::BadDate => "Validate a literal whose dob has a 3-digit year (fails)",
            Demo::OpenAI => "Extract a user with a single function tool call",
            Demo::Agent => "Extract a user with an agent that retries invalid results",
        }
    }

    /// Whether the demo calls the completion service
    pub fn needs_provider(&self) -> bool {
        matches!(self, Demo::OpenAI | Demo::Agent)
    }

    /// Input for the literal demos
    pub fn literal_input(&self) -> Option<Value> {
        match self {
            Demo::Literal => Some(json!({"id": "1", "name": "John Doe", "dob": "1987-01-28"})),
            Demo::Invalid => Some(json!({"id": "1", "name": "John Doe", "dob": [1, 2]})),
            Demo::BadDate => {
                Some(json!({"id": "123", "name": "Samuel Colvin", "dob": "198-1-28"}))
            }
            Demo::OpenAI | Demo::Agent => None,
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Demo {
    type Err = RecordForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Demo::all()
            .iter()
            .copied()
            .find(|demo| demo.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Demo::all().iter().map(Demo::name).collect();
                RecordForgeError::NotFound(format!(
                    "demo '{}'. Available: {}",
                    s.trim(),
                    names.join(", ")
                ))
            })
    }
}

/// Validate a literal demo's input
pub fn validate_literal(demo: Demo) -> Result<User> {
    let input = demo.literal_input().ok_or_else(|| {
        RecordForgeError::InvalidInput(format!("demo '{}' has no literal input", demo))
    })?;
    Ok(User::model_validate(&input)?)
}

/// Extract with one forced tool call named after the schema
pub async fn extract_with_tool_call<P: LLMProvider>(provider: P) -> Result<User> {
    ToolCallExtractor::new(provider)
        .extract::<User>(SYSTEM_PROMPT, USER_PROMPT)
        .await
}

/// Extract with an agent whose result type is [`User`]
pub async fn extract_with_agent<P: LLMProvider>(provider: P) -> Result<User> {
    let agent = Agent::<P, User>::new(provider).with_system_prompt(SYSTEM_PROMPT);
    Ok(agent.run(USER_PROMPT).await?.data)
}

/// Run a demo and render what it prints.
///
/// `provider` is only consulted by demos that call the completion service.
pub async fn run<F>(demo: Demo, provider: F) -> Result<String>
where
    F: FnOnce() -> Result<Box<dyn LLMProvider>>,
{
    match demo {
        Demo::Literal | Demo::Invalid | Demo::BadDate => {
            validate_literal(demo).map(|user| user.to_string())
        }
        Demo::OpenAI => {
            let user = extract_with_tool_call(provider()?).await?;
            Ok(format!("{:?}", user))
        }
        Demo::Agent => {
            let user = extract_with_agent(provider()?).await?;
            Ok(user.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_provider() -> Result<Box<dyn LLMProvider>> {
        Err(RecordForgeError::LLMApiKeyMissing("openai".to_string()))
    }

    #[test]
    fn test_parse_demo_names() {
        for demo in Demo::all() {
            assert_eq!(demo.name().parse::<Demo>().unwrap(), *demo);
        }
        assert_eq!(" OpenAI ".parse::<Demo>().unwrap(), Demo::OpenAI);
        assert!("nope".parse::<Demo>().is_err());
    }

    #[test]
    fn test_literal_demo_prints_record() {
        let output = tokio_test::block_on(run(Demo::Literal, no_provider)).unwrap();
        assert_eq!(output, "id=1 name='John Doe' dob=1987-01-28");
    }

    #[test]
    fn test_invalid_demos_fail_validation() {
        let err = tokio_test::block_on(run(Demo::Invalid, no_provider)).unwrap_err();
        assert_eq!(err.as_validation().unwrap().codes(), vec!["date_type"]);

        let err = validate_literal(Demo::BadDate).unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().codes(),
            vec!["date_from_datetime_parsing"]
        );
    }

    #[test]
    fn test_llm_demos_need_provider() {
        assert!(Demo::OpenAI.needs_provider());
        assert!(!Demo::Literal.needs_provider());

        let err = tokio_test::block_on(run(Demo::Agent, no_provider)).unwrap_err();
        assert!(matches!(err, RecordForgeError::LLMApiKeyMissing(_)));
        assert!(validate_literal(Demo::Agent).is_err());
    }
}
