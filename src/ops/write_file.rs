use std::fs;

use crate::error::ToolError;
use crate::guard::WorkingDirectory;

use super::confine;

/// Creates or overwrites `file_path` with `content`, creating missing parent
/// directories inside the sandbox.
pub fn write_file(
    root: &WorkingDirectory,
    file_path: &str,
    content: &str,
) -> Result<String, ToolError> {
    // The guard resolves the full target, so every directory created below is
    // already known to sit inside the root.
    let target = confine(root, file_path, "write to")?;

    if target.is_dir() {
        return Err(ToolError::IsADirectory {
            path: file_path.to_string(),
        });
    }

    if let Some(parent) = target.parent() {
        if !parent.is_dir() {
            fs::create_dir_all(parent)
                .map_err(|error| ToolError::io("creating parent directories for", parent, error))?;
        }
    }

    fs::write(&target, content).map_err(|error| ToolError::io("writing", &target, error))?;

    tracing::debug!(
        file = %root.display_relative(&target),
        bytes = content.len(),
        "wrote file"
    );

    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({} bytes written)",
        content.len()
    ))
}
