//! Model-facing declarations for the sandbox operations and the bridge from
//! provider tool calls to the sandbox dispatcher.

use agent_provider::{ToolCallRequest, ToolDefinition, ToolResult};
use agent_sandbox::dispatch::{LIST_DIRECTORY, READ_FILE, RUN_SCRIPT, WRITE_FILE};
use agent_sandbox::Dispatcher;
use serde_json::json;

/// Declarations for the four sandbox operations. The working directory is
/// never declared; the host injects it.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: LIST_DIRECTORY.to_string(),
            description: Some(
                "Lists files in the specified directory along with their sizes, constrained to the working directory."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                    }
                }
            }),
        },
        ToolDefinition {
            name: READ_FILE.to_string(),
            description: Some(
                "Reads the contents of a file, constrained to the working directory. Long files are truncated."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the file to read, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: WRITE_FILE.to_string(),
            description: Some(
                "Writes content to a file, creating parent directories as needed and overwriting any existing file, constrained to the working directory."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the file to write, relative to the working directory."
                    },
                    "content": {
                        "type": "string",
                        "description": "The full content to write to the file."
                    }
                },
                "required": ["file_path", "content"]
            }),
        },
        ToolDefinition {
            name: RUN_SCRIPT.to_string(),
            description: Some(
                "Executes a Python (.py) or shell (.sh) script inside the working directory with optional arguments and returns its output."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the script to execute, relative to the working directory."
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional command-line arguments passed to the script."
                    }
                },
                "required": ["file_path"]
            }),
        },
    ]
}

/// Runs one provider tool call through the sandbox. Failures come back as
/// error results carrying the `Error: ` text, never as a Rust error.
pub fn execute_tool_call(dispatcher: &Dispatcher, call: ToolCallRequest) -> ToolResult {
    tracing::info!(tool = %call.tool_name, call_id = %call.call_id, "executing tool call");
    let output = dispatcher.dispatch(&call.tool_name, &call.arguments);

    if output.ok {
        ToolResult::success(call.call_id, call.tool_name, output.content)
    } else {
        ToolResult::error(call.call_id, call.tool_name, output.content)
    }
}

#[cfg(test)]
mod tests {
    use agent_sandbox::OPERATION_NAMES;

    use super::tool_definitions;

    #[test]
    fn definitions_cover_every_operation_in_order() {
        let names: Vec<String> = tool_definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, OPERATION_NAMES);
    }

    #[test]
    fn definitions_never_declare_working_directory() {
        for definition in tool_definitions() {
            let properties = definition.input_schema["properties"]
                .as_object()
                .expect("object schema");
            assert!(
                !properties.contains_key("working_directory"),
                "{} declares working_directory",
                definition.name
            );
            assert!(definition.description.is_some());
        }
    }
}
