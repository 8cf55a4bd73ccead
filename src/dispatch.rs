//! Name-based entry point used by the model-response layer.
//!
//! The caller supplies an operation name and a JSON argument object. The
//! working directory is fixed when the [`Dispatcher`] is built and is never
//! read from the arguments.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SandboxConfig;
use crate::error::ToolError;
use crate::guard::{RootError, WorkingDirectory};
use crate::ops;

pub const LIST_DIRECTORY: &str = "list_directory";
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const RUN_SCRIPT: &str = "run_script";

/// Canonical operation names, in declaration order.
pub const OPERATION_NAMES: [&str; 4] = [LIST_DIRECTORY, READ_FILE, WRITE_FILE, RUN_SCRIPT];

/// Prefix carried by every failed outcome.
pub const ERROR_PREFIX: &str = "Error: ";

/// One sandboxed operation with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ListDirectory { directory: String },
    ReadFile { file_path: String },
    WriteFile { file_path: String, content: String },
    RunScript { file_path: String, args: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct ListDirectoryArgs {
    #[serde(default)]
    directory: String,
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct RunScriptArgs {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

impl ToolCall {
    /// Parses a model-issued call. Legacy names (`get_files_info`,
    /// `get_file_content`, `run_python_file`) map to their current operation.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let call = match canonical_name(name) {
            Some(LIST_DIRECTORY) => {
                let args: ListDirectoryArgs = parse_args(LIST_DIRECTORY, arguments)?;
                Self::ListDirectory {
                    directory: args.directory,
                }
            }
            Some(READ_FILE) => {
                let args: ReadFileArgs = parse_args(READ_FILE, arguments)?;
                Self::ReadFile {
                    file_path: args.file_path,
                }
            }
            Some(WRITE_FILE) => {
                let args: WriteFileArgs = parse_args(WRITE_FILE, arguments)?;
                Self::WriteFile {
                    file_path: args.file_path,
                    content: args.content,
                }
            }
            Some(RUN_SCRIPT) => {
                let args: RunScriptArgs = parse_args(RUN_SCRIPT, arguments)?;
                Self::RunScript {
                    file_path: args.file_path,
                    args: args.args,
                }
            }
            _ => {
                return Err(ToolError::UnknownOperation {
                    name: name.to_string(),
                })
            }
        };

        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListDirectory { .. } => LIST_DIRECTORY,
            Self::ReadFile { .. } => READ_FILE,
            Self::WriteFile { .. } => WRITE_FILE,
            Self::RunScript { .. } => RUN_SCRIPT,
        }
    }
}

fn canonical_name(name: &str) -> Option<&'static str> {
    match name.trim() {
        LIST_DIRECTORY | "get_files_info" => Some(LIST_DIRECTORY),
        READ_FILE | "get_file_content" => Some(READ_FILE),
        WRITE_FILE => Some(WRITE_FILE),
        RUN_SCRIPT | "run_python_file" => Some(RUN_SCRIPT),
        _ => None,
    }
}

fn parse_args<T: DeserializeOwned>(
    operation: &'static str,
    arguments: &Value,
) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };

    serde_json::from_value(arguments).map_err(|error| ToolError::InvalidArguments {
        operation,
        message: error.to_string(),
    })
}

/// Uniform outcome of one dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub ok: bool,
    pub content: String,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            ok: true,
            content: content.into(),
        }
    }

    /// Failure text always starts with [`ERROR_PREFIX`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            content: format!("{ERROR_PREFIX}{error}"),
        }
    }
}

impl From<Result<String, ToolError>> for ToolOutput {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(content) => Self::ok(content),
            Err(error) => Self::fail(error),
        }
    }
}

/// Owns the sandbox root and limits for one agent session.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    root: WorkingDirectory,
    config: SandboxConfig,
}

impl Dispatcher {
    pub fn new(
        working_directory: impl AsRef<Path>,
        config: SandboxConfig,
    ) -> Result<Self, RootError> {
        Ok(Self {
            root: WorkingDirectory::new(working_directory)?,
            config,
        })
    }

    pub fn working_directory(&self) -> &WorkingDirectory {
        &self.root
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Parses and executes a call by name. Never panics and never returns
    /// anything but a [`ToolOutput`].
    pub fn dispatch(&self, name: &str, arguments: &Value) -> ToolOutput {
        match ToolCall::parse(name, arguments) {
            Ok(call) => self.execute(call),
            Err(error) => {
                tracing::warn!(name, %error, "rejected tool call");
                ToolOutput::fail(error)
            }
        }
    }

    pub fn execute(&self, call: ToolCall) -> ToolOutput {
        let operation = call.name();
        let output = run_guarded(operation, || self.execute_unguarded(call));
        tracing::debug!(operation, ok = output.ok, "tool call finished");
        output
    }

    fn execute_unguarded(&self, call: ToolCall) -> Result<String, ToolError> {
        match call {
            ToolCall::ListDirectory { directory } => ops::list_directory(&self.root, &directory),
            ToolCall::ReadFile { file_path } => {
                ops::read_file(&self.root, &file_path, self.config.max_read_chars)
            }
            ToolCall::WriteFile { file_path, content } => {
                ops::write_file(&self.root, &file_path, &content)
            }
            ToolCall::RunScript { file_path, args } => {
                ops::run_script(&self.root, &file_path, &args, &self.config)
            }
        }
    }
}

/// Runs one operation, turning a panic into an `Internal` failure.
fn run_guarded(
    operation: &'static str,
    run: impl FnOnce() -> Result<String, ToolError>,
) -> ToolOutput {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(result) => ToolOutput::from(result),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(operation, %message, "operation panicked");
            ToolOutput::fail(ToolError::Internal { operation, message })
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}
