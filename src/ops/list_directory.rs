use std::fs;

use crate::error::ToolError;
use crate::guard::WorkingDirectory;

use super::confine;

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntryInfo {
    pub name: String,
    /// Platform-reported size; not a recursive total for directories.
    pub size: u64,
    pub is_dir: bool,
}

impl DirectoryEntryInfo {
    pub fn render(&self) -> String {
        format!(
            "- {}: file_size={} bytes, is_dir={}",
            self.name, self.size, self.is_dir
        )
    }
}

/// Lists the immediate children of `directory` in filesystem order, one line
/// per entry. Fails as a whole if any entry cannot be stat'ed.
pub fn list_directory(root: &WorkingDirectory, directory: &str) -> Result<String, ToolError> {
    let target = confine(root, directory, "list")?;

    if !target.is_dir() {
        return Err(ToolError::NotADirectory {
            path: directory.to_string(),
        });
    }

    let read_dir = fs::read_dir(&target).map_err(|error| ToolError::io("listing", &target, error))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|error| ToolError::io("listing", &target, error))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks, so a broken link fails the whole listing.
        let metadata = fs::metadata(entry.path()).map_err(|source| ToolError::EntrySize {
            entry: name.clone(),
            source,
        })?;

        entries.push(DirectoryEntryInfo {
            name,
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        });
    }

    tracing::debug!(
        directory = %root.display_relative(&target),
        entries = entries.len(),
        "listed directory"
    );

    Ok(entries
        .iter()
        .map(DirectoryEntryInfo::render)
        .collect::<Vec<_>>()
        .join("\n"))
}
