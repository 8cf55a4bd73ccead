//! Transport-only Gemini `generateContent` client primitives.
//!
//! This crate owns request/response building and parsing for the
//! `models/{model}:generateContent` endpoint only. One call is one POST: no
//! streaming and no retry. API-key loading is the caller's concern.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod url;

pub use client::GeminiApiClient;
pub use config::GeminiApiConfig;
pub use error::GeminiApiError;
pub use payload::{
    Candidate, Content, FunctionCall, FunctionCallingConfig, FunctionDeclaration,
    FunctionResponse, GenerateContentRequest, GenerateContentResponse, Part, Tool, ToolConfig,
    UsageMetadata,
};
pub use crate::url::generate_content_url;
