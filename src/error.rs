//! Error taxonomy shared by every sandboxed operation.
//!
//! Operations return `Result<String, ToolError>`. The dispatcher renders the
//! `Err` side as `Error: <display>`, so each message below is written to be
//! read by the model as-is.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot {action} \"{path}\" as it is outside the permitted working directory")]
    Confinement { action: &'static str, path: String },

    #[error("File \"{path}\" not found.")]
    NotFound { path: String },

    #[error("\"{path}\" is not a directory")]
    NotADirectory { path: String },

    #[error("File not found or is not a regular file: \"{path}\"")]
    NotAFile { path: String },

    #[error("\"{path}\" is a directory, not a file")]
    IsADirectory { path: String },

    #[error("\"{path}\" is not a supported script (expected one of: {expected})")]
    UnsupportedScript { path: String, expected: String },

    #[error("I/O error while {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not get size for '{entry}': {source}")]
    EntrySize {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Failed to launch {interpreter}: {source}")]
    Launch {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown function: {name}")]
    UnknownOperation { name: String },

    #[error("Invalid arguments for {operation}: {message}")]
    InvalidArguments {
        operation: &'static str,
        message: String,
    },

    #[error("Unexpected failure in {operation}: {message}")]
    Internal {
        operation: &'static str,
        message: String,
    },
}

impl ToolError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ToolError;

    #[test]
    fn confinement_message_names_action_and_requested_path() {
        let error = ToolError::Confinement {
            action: "list",
            path: "/etc".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Cannot list \"/etc\" as it is outside the permitted working directory"
        );
    }

    #[test]
    fn io_message_includes_operation_path_and_cause() {
        let error = ToolError::io(
            "writing",
            "/tmp/out.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(error.to_string(), "I/O error while writing /tmp/out.txt: denied");
    }
}
