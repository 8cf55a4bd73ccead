//! Deterministic mock implementation of the shared `agent_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and contract-level integration testing. Runs replay a fixed
//! script of model turns, sending scripted tool calls through the host.

use agent_provider::{
    ProviderProfile, RunEvent, RunMessage, RunProvider, RunRequest, ToolCallRequest, ToolResult,
};
use serde_json::{json, Value};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";
pub const MOCK_MODEL_ID: &str = "mock";

/// One scripted model turn.
#[derive(Debug, Clone, PartialEq)]
pub struct MockTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<MockToolCall>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockToolCall {
    pub tool_name: String,
    pub arguments: Value,
}

impl MockTurn {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn tool_call(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            text: None,
            tool_calls: vec![MockToolCall {
                tool_name: tool_name.into(),
                arguments,
            }],
        }
    }

    #[must_use]
    pub fn with_tool_call(mut self, tool_name: impl Into<String>, arguments: Value) -> Self {
        self.tool_calls.push(MockToolCall {
            tool_name: tool_name.into(),
            arguments,
        });
        self
    }
}

/// Deterministic mock provider used by `coding_agent` tests and local runs.
#[derive(Debug)]
pub struct MockProvider {
    turns: Vec<MockTurn>,
}

impl MockProvider {
    /// Creates a mock provider replaying `turns` in order.
    #[must_use]
    pub fn new(turns: Vec<MockTurn>) -> Self {
        Self { turns }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(vec![
            MockTurn::text("Let me look at the working directory.")
                .with_tool_call("list_directory", json!({ "directory": "." })),
            MockTurn::text("Those are the files in the working directory."),
        ])
    }
}

impl RunProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: MOCK_MODEL_ID.to_string(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        execute_tool: &mut dyn FnMut(ToolCallRequest) -> ToolResult,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;
        let prompt_tokens = word_count(req.messages.iter().filter_map(|message| match message {
            RunMessage::UserText { text } => Some(text.as_str()),
            _ => None,
        }));

        emit(RunEvent::Started { run_id });

        for (turn_index, turn) in self.turns.iter().enumerate() {
            emit(RunEvent::Usage {
                run_id,
                prompt_tokens,
                response_tokens: word_count(turn.text.as_deref()),
            });

            if let Some(text) = turn.text.as_ref().filter(|text| !text.is_empty()) {
                emit(RunEvent::Text {
                    run_id,
                    text: text.clone(),
                });
            }

            for (call_index, call) in turn.tool_calls.iter().enumerate() {
                let call = ToolCallRequest {
                    call_id: format!("mock-{turn_index}-{call_index}"),
                    tool_name: call.tool_name.clone(),
                    arguments: call.arguments.clone(),
                };
                emit(RunEvent::ToolCallStarted {
                    run_id,
                    call: call.clone(),
                });
                let result = execute_tool(call);
                emit(RunEvent::ToolCallFinished { run_id, result });
            }
        }

        emit(RunEvent::Finished { run_id });
        Ok(())
    }
}

fn word_count<'a>(texts: impl IntoIterator<Item = &'a str>) -> u64 {
    texts
        .into_iter()
        .map(|text| text.split_whitespace().count() as u64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_events(provider: &MockProvider) -> (Vec<ToolCallRequest>, Vec<RunEvent>) {
        let mut calls = Vec::new();
        let mut events = Vec::new();
        provider
            .run(
                RunRequest {
                    run_id: 7,
                    messages: vec![RunMessage::UserText {
                        text: "list the files".to_string(),
                    }],
                    instructions: "system instructions".to_string(),
                    tools: Vec::new(),
                },
                &mut |call| {
                    calls.push(call.clone());
                    ToolResult::success(call.call_id, call.tool_name, "- a.txt: file_size=1 bytes")
                },
                &mut |event| events.push(event),
            )
            .expect("mock run should succeed");
        (calls, events)
    }

    #[test]
    fn profile_exposes_explicit_mock_provider_identity() {
        let profile = MockProvider::new(Vec::new()).profile();

        assert_eq!(profile.provider_id, MOCK_PROVIDER_ID);
        assert_eq!(profile.model_id, MOCK_MODEL_ID);
    }

    #[test]
    fn default_script_lists_working_directory_then_answers() {
        let (calls, events) = collect_events(&MockProvider::default());

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "list_directory");
        assert_eq!(calls[0].arguments, json!({ "directory": "." }));
        assert!(matches!(
            events.first(),
            Some(RunEvent::Started { run_id: 7 })
        ));
        assert!(matches!(
            events.last(),
            Some(RunEvent::Finished { run_id: 7 })
        ));
        assert!(events.iter().any(|event| matches!(
            event,
            RunEvent::ToolCallFinished { result, .. } if result.call_id == "mock-0-0"
        )));
    }

    #[test]
    fn run_reports_word_counts_as_usage() {
        let provider = MockProvider::new(vec![MockTurn::text("one two three")]);
        let (_, events) = collect_events(&provider);

        assert_eq!(
            events,
            vec![
                RunEvent::Started { run_id: 7 },
                RunEvent::Usage {
                    run_id: 7,
                    prompt_tokens: 3,
                    response_tokens: 3,
                },
                RunEvent::Text {
                    run_id: 7,
                    text: "one two three".to_string(),
                },
                RunEvent::Finished { run_id: 7 },
            ]
        );
    }

    #[test]
    fn empty_script_finishes_immediately() {
        let (calls, events) = collect_events(&MockProvider::new(Vec::new()));

        assert!(calls.is_empty());
        assert_eq!(
            events,
            vec![
                RunEvent::Started { run_id: 7 },
                RunEvent::Finished { run_id: 7 }
            ]
        );
    }
}
