use std::fs::File;
use std::io::Read;

use crate::error::ToolError;
use crate::guard::WorkingDirectory;

use super::confine;

/// Longest UTF-8 encoding of a single character.
const MAX_UTF8_CHAR_BYTES: u64 = 4;

/// Returns the text of `file_path`, cut at `max_chars` characters with a
/// trailing marker when longer. Invalid UTF-8 is replaced, not rejected.
pub fn read_file(
    root: &WorkingDirectory,
    file_path: &str,
    max_chars: usize,
) -> Result<String, ToolError> {
    let target = confine(root, file_path, "read")?;

    if !target.is_file() {
        return Err(ToolError::NotAFile {
            path: file_path.to_string(),
        });
    }

    let file = File::open(&target).map_err(|error| ToolError::io("opening", &target, error))?;
    let total_bytes = file
        .metadata()
        .map_err(|error| ToolError::io("reading metadata of", &target, error))?
        .len();

    // Enough bytes to hold one character past the limit, whatever the encoding.
    let byte_limit = (max_chars as u64 + 1).saturating_mul(MAX_UTF8_CHAR_BYTES);
    let mut bytes = Vec::new();
    file.take(byte_limit)
        .read_to_end(&mut bytes)
        .map_err(|error| ToolError::io("reading", &target, error))?;

    let text = String::from_utf8_lossy(&bytes);
    let content = match text.char_indices().nth(max_chars) {
        Some((cutoff, _)) => {
            tracing::debug!(file = file_path, total_bytes, max_chars, "truncated file content");
            format!(
                "{}[...File \"{file_path}\" truncated at {max_chars} characters ({total_bytes} bytes total)]",
                &text[..cutoff]
            )
        }
        None => text.into_owned(),
    };

    tracing::debug!(file = %root.display_relative(&target), "read file");
    Ok(content)
}
