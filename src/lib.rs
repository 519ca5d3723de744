//! Record-Forge Library
//!
//! Typed record validation with coercion and structured errors, plus
//! extraction of records from text through a completion service.
//! The main binary is in src/main.rs.

pub mod cli;
pub mod config;
pub mod demos;
pub mod error;
pub mod extract;
pub mod llm;
pub mod schema;
pub mod user;

pub use error::{RecordForgeError, Result};
pub use schema::{Model, Schema, ValidationError};
pub use user::User;
