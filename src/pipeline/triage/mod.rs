//! Triage classification pipeline.
//!
//! FetchHistory → Classify (context → prompt → model → parse, or fallback)
//! → Persist. Classification never fails from the caller's point of view:
//! any error inside the Classify step is replaced by the conservative
//! fallback result.

pub mod types;
pub mod context;
pub mod prompt;
pub mod ollama;
pub mod parser;
pub mod fallback;
pub mod classifier;
pub mod orchestrator;
pub mod store;

pub use types::*;
pub use context::*;
pub use prompt::*;
pub use ollama::*;
pub use parser::*;
pub use fallback::*;
pub use classifier::*;
pub use orchestrator::*;
pub use store::*;

use thiserror::Error;

use crate::models::ValidationError;

/// Failures of the remote model call. Never retried internally.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Model endpoint unreachable at {0}")]
    Connection(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model endpoint rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    #[error("Model quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Model endpoint returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unreadable model response: {0}")]
    ResponseBody(String),
}

/// A model reply that does not satisfy the triage schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("JSON parsing error: {0}")]
    Json(String),

    #[error("Model reply is not a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unknown triage level: {0}")]
    UnknownTriageLevel(String),
}

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid triage request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("Model invocation failed: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Model reply could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error("Patient history lookup failed: {0}")]
    Lookup(String),
}
