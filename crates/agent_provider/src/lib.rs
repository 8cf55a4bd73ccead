//! Minimal provider-agnostic contract for executing a single model run.
//!
//! This crate defines only the run lifecycle and the host-mediated
//! tool-calling contract. Transport details and wire payloads live in the
//! provider crates.

use std::fmt;

use serde_json::Value;

/// Identifier for one provider run.
pub type RunId = u64;

/// Error returned while constructing/configuring a provider before any run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Provider-neutral model-facing message history item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMessage {
    UserText {
        text: String,
    },
    AssistantText {
        text: String,
    },
    ToolCall {
        call_id: String,
        tool_name: String,
        arguments: Value,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: Value,
        is_error: bool,
    },
}

/// Input required to start a provider run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub run_id: RunId,
    pub messages: Vec<RunMessage>,
    pub instructions: String,
    pub tools: Vec<ToolDefinition>,
}

/// Generic host-mediated tool definition exposed to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Provider request envelope for one host tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

/// Host tool call result returned back to providers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub is_error: bool,
    pub content: Value,
}

impl ToolResult {
    /// Constructs a successful tool result.
    #[must_use]
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<Value>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            is_error: false,
            content: content.into(),
        }
    }

    /// Constructs a tool error result.
    #[must_use]
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<Value>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            is_error: true,
            content: content.into(),
        }
    }

    /// Content as display text: strings verbatim, anything else as JSON.
    #[must_use]
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Provider-emitted lifecycle event for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        run_id: RunId,
    },
    /// Model-authored text for one turn.
    Text {
        run_id: RunId,
        text: String,
    },
    ToolCallStarted {
        run_id: RunId,
        call: ToolCallRequest,
    },
    ToolCallFinished {
        run_id: RunId,
        result: ToolResult,
    },
    /// Token accounting for one model round trip.
    Usage {
        run_id: RunId,
        prompt_tokens: u64,
        response_tokens: u64,
    },
    Finished {
        run_id: RunId,
    },
    Failed {
        run_id: RunId,
        error: String,
    },
}

impl RunEvent {
    /// Returns the run identifier associated with this event.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Started { run_id }
            | Self::Text { run_id, .. }
            | Self::ToolCallStarted { run_id, .. }
            | Self::ToolCallFinished { run_id, .. }
            | Self::Usage { run_id, .. }
            | Self::Finished { run_id }
            | Self::Failed { run_id, .. } => *run_id,
        }
    }

    /// Returns true when this event terminates the run lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }
}

/// Immutable metadata describing a run provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for executing one run request.
pub trait RunProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Executes a run request and emits lifecycle events in provider order.
    ///
    /// Providers request host tool execution synchronously through
    /// `execute_tool`; calls are serial from the caller's perspective. A
    /// returned `Err` means the provider could not even start the run.
    fn run(
        &self,
        req: RunRequest,
        execute_tool: &mut dyn FnMut(ToolCallRequest) -> ToolResult,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String>;
}
