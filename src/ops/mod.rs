//! The four sandboxed file-system operations.
//!
//! Each operation takes the sandbox root explicitly and resolves its path
//! argument through the guard before touching the filesystem.

mod list_directory;
mod read_file;
mod run_script;
mod write_file;

use std::path::PathBuf;

pub use list_directory::{list_directory, DirectoryEntryInfo};
pub use read_file::read_file;
pub use run_script::{run_script, ExecutionResult, ExitOutcome};
pub use write_file::write_file;

use crate::error::ToolError;
use crate::guard::{GuardError, WorkingDirectory};

/// Resolves `requested` or maps the guard failure to the operation's error.
fn confine(
    root: &WorkingDirectory,
    requested: &str,
    action: &'static str,
) -> Result<PathBuf, ToolError> {
    root.resolve(requested).map_err(|error| match error {
        GuardError::Escape(resolved) => {
            tracing::warn!(
                action,
                requested,
                resolved = %resolved.display(),
                "rejected path outside working directory"
            );
            ToolError::Confinement {
                action,
                path: requested.to_string(),
            }
        }
        GuardError::Resolve { path, source } => ToolError::io("resolving", path, source),
    })
}
