//! Gemini-backed implementation of the shared `agent_provider` contract.
//!
//! The adapter drives the function-calling loop: every model turn that asks
//! for function calls is answered through the host `execute_tool` callback,
//! and the loop ends on the first turn without calls or after `max_turns`.

use std::sync::Arc;
use std::time::Duration;

use agent_provider::{
    ProviderInitError, ProviderProfile, RunEvent, RunMessage, RunProvider, RunRequest,
    ToolCallRequest, ToolDefinition, ToolResult,
};
use gemini_api::{
    Content, FunctionCall, FunctionDeclaration, GeminiApiClient, GeminiApiConfig, GeminiApiError,
    GenerateContentRequest, GenerateContentResponse, Part,
};
use serde_json::{json, Map, Value};

/// Stable provider identifier used by `coding_agent` startup selection.
pub const GEMINI_PROVIDER_ID: &str = "gemini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-001";
pub const DEFAULT_MAX_TURNS: usize = 20;

/// Runtime configuration for the Gemini provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiProviderConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub max_turns: usize,
}

impl GeminiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: None,
            timeout: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    fn into_gemini_api_config(self) -> GeminiApiConfig {
        let mut config = GeminiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait ContentClient: Send + Sync {
    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError>;
}

#[derive(Debug)]
struct DefaultContentClient {
    client: GeminiApiClient,
}

impl ContentClient for DefaultContentClient {
    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                GeminiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.generate_content(model, request))
    }
}

/// `RunProvider` adapter backed by `gemini_api` transport primitives.
pub struct GeminiProvider {
    model_id: String,
    max_turns: usize,
    client: Arc<dyn ContentClient>,
}

impl GeminiProvider {
    /// Creates a provider using real Gemini API transport.
    pub fn new(config: GeminiProviderConfig) -> Result<Self, ProviderInitError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderInitError::new(
                "GEMINI_API_KEY is not set; the gemini provider needs an API key",
            ));
        }

        let model_id = sanitize_model_id(&config.model_id);
        let max_turns = config.max_turns.max(1);
        let client = Arc::new(DefaultContentClient {
            client: GeminiApiClient::new(config.into_gemini_api_config())
                .map_err(map_init_error)?,
        });

        Ok(Self {
            model_id,
            max_turns,
            client,
        })
    }

    #[cfg(test)]
    fn with_content_client_for_tests(
        model_id: &str,
        max_turns: usize,
        client: Arc<dyn ContentClient>,
    ) -> Self {
        Self {
            model_id: sanitize_model_id(model_id),
            max_turns: max_turns.max(1),
            client,
        }
    }
}

impl RunProvider for GeminiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GEMINI_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn run(
        &self,
        req: RunRequest,
        execute_tool: &mut dyn FnMut(ToolCallRequest) -> ToolResult,
        emit: &mut dyn FnMut(RunEvent),
    ) -> Result<(), String> {
        let run_id = req.run_id;
        emit(RunEvent::Started { run_id });

        let declarations: Vec<FunctionDeclaration> =
            req.tools.iter().map(function_declaration).collect();
        let mut contents = history_to_contents(&req.messages);
        if contents.is_empty() {
            emit(RunEvent::Failed {
                run_id,
                error: "Run request has no messages to send".to_string(),
            });
            return Ok(());
        }

        for turn in 0..self.max_turns {
            let request = GenerateContentRequest::new(contents.clone())
                .with_system_instruction(req.instructions.as_str())
                .with_function_declarations(declarations.clone());

            tracing::debug!(run_id, turn, model = %self.model_id, "requesting model turn");
            let response = match self.client.generate(&self.model_id, &request) {
                Ok(response) => response,
                Err(error) => {
                    emit(RunEvent::Failed {
                        run_id,
                        error: format!("Gemini API request failed: {error}"),
                    });
                    return Ok(());
                }
            };

            if let Some(usage) = response.usage_metadata {
                emit(RunEvent::Usage {
                    run_id,
                    prompt_tokens: usage.prompt_token_count,
                    response_tokens: usage.candidates_token_count,
                });
            }

            let Some(model_content) = response.first_content().cloned() else {
                let reason = response.finish_reason().unwrap_or("no candidates");
                emit(RunEvent::Failed {
                    run_id,
                    error: format!("Gemini API returned no content ({reason})"),
                });
                return Ok(());
            };

            if let Some(text) = response.text() {
                emit(RunEvent::Text { run_id, text });
            }

            let calls: Vec<FunctionCall> =
                response.function_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                emit(RunEvent::Finished { run_id });
                return Ok(());
            }

            contents.push(Content::model(model_content.parts));

            let mut response_parts = Vec::with_capacity(calls.len());
            for (index, call) in calls.into_iter().enumerate() {
                let call = ToolCallRequest {
                    call_id: call.id.unwrap_or_else(|| format!("call-{turn}-{index}")),
                    tool_name: call.name,
                    arguments: call.args,
                };
                emit(RunEvent::ToolCallStarted {
                    run_id,
                    call: call.clone(),
                });

                let result = execute_tool(call);
                response_parts.push(function_response_part(&result));
                emit(RunEvent::ToolCallFinished { run_id, result });
            }

            contents.push(Content::user(response_parts));
        }

        tracing::warn!(run_id, max_turns = self.max_turns, "turn limit reached");
        emit(RunEvent::Failed {
            run_id,
            error: format!(
                "Reached the maximum of {} model turns without a final response",
                self.max_turns
            ),
        });
        Ok(())
    }
}

/// Maps provider-neutral history into Gemini `contents`.
fn history_to_contents(messages: &[RunMessage]) -> Vec<Content> {
    let mut contents: Vec<Content> = Vec::new();

    for message in messages {
        let (role_is_model, part) = match message {
            RunMessage::UserText { text } => (false, Part::text(text.clone())),
            RunMessage::AssistantText { text } => (true, Part::text(text.clone())),
            RunMessage::ToolCall {
                tool_name,
                arguments,
                ..
            } => (
                true,
                Part::function_call(FunctionCall {
                    name: tool_name.clone(),
                    args: arguments.clone(),
                    id: None,
                }),
            ),
            RunMessage::ToolResult {
                tool_name,
                content,
                is_error,
                ..
            } => (
                false,
                Part::function_response(tool_name.clone(), response_payload(content, *is_error)),
            ),
        };

        let role = if role_is_model {
            gemini_api::payload::ROLE_MODEL
        } else {
            gemini_api::payload::ROLE_USER
        };

        // Consecutive items from the same side share one content entry.
        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => last.parts.push(part),
            _ if role_is_model => contents.push(Content::model(vec![part])),
            _ => contents.push(Content::user(vec![part])),
        }
    }

    contents
}

fn function_response_part(result: &ToolResult) -> Part {
    Part::function_response(
        result.tool_name.clone(),
        response_payload(&result.content, result.is_error),
    )
}

fn response_payload(content: &Value, is_error: bool) -> Value {
    if is_error {
        json!({ "error": content })
    } else {
        json!({ "result": content })
    }
}

fn function_declaration(tool: &ToolDefinition) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: Some(gemini_schema(&tool.input_schema)),
    }
}

/// Rewrites JSON-schema `type` names into the upper-case form Gemini expects.
fn gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut converted = Map::with_capacity(map.len());
            for (key, value) in map {
                let value = match (key.as_str(), value) {
                    ("type", Value::String(kind)) => Value::String(kind.to_ascii_uppercase()),
                    // Property names are user data, not schema keywords.
                    ("properties", Value::Object(properties)) => Value::Object(
                        properties
                            .iter()
                            .map(|(name, property)| (name.clone(), gemini_schema(property)))
                            .collect(),
                    ),
                    _ => gemini_schema(value),
                };
                converted.insert(key.clone(), value);
            }
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(items.iter().map(gemini_schema).collect()),
        other => other.clone(),
    }
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        DEFAULT_GEMINI_MODEL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: GeminiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize gemini provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard};

    use gemini_api::{Candidate, UsageMetadata};
    use pretty_assertions::assert_eq;

    use super::*;

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    struct FakeContentClient {
        outcomes: Mutex<VecDeque<Result<GenerateContentResponse, GeminiApiError>>>,
        observed: Mutex<Vec<(String, GenerateContentRequest)>>,
    }

    impl FakeContentClient {
        fn new(outcomes: Vec<Result<GenerateContentResponse, GeminiApiError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                observed: Mutex::new(Vec::new()),
            })
        }

        fn observed(&self) -> Vec<(String, GenerateContentRequest)> {
            lock_unpoisoned(&self.observed).clone()
        }
    }

    impl ContentClient for FakeContentClient {
        fn generate(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, GeminiApiError> {
            lock_unpoisoned(&self.observed).push((model.to_string(), request.clone()));
            lock_unpoisoned(&self.outcomes)
                .pop_front()
                .expect("fake client received more requests than scripted")
        }
    }

    fn model_turn(parts: Vec<Part>) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content::model(parts)),
                finish_reason: Some("STOP".to_string()),
            }],
            usage_metadata: Some(UsageMetadata {
                prompt_token_count: 10,
                candidates_token_count: 4,
                total_token_count: 14,
            }),
        }
    }

    fn call_part(name: &str, args: Value) -> Part {
        Part::function_call(FunctionCall {
            name: name.to_string(),
            args,
            id: None,
        })
    }

    fn request(tools: Vec<ToolDefinition>) -> RunRequest {
        RunRequest {
            run_id: 3,
            messages: vec![RunMessage::UserText {
                text: "what files are in the root?".to_string(),
            }],
            instructions: "You are a helpful AI coding agent.".to_string(),
            tools,
        }
    }

    fn list_tool() -> ToolDefinition {
        ToolDefinition {
            name: "list_directory".to_string(),
            description: Some("Lists files".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "directory": {"type": "string", "description": "Relative path"}
                }
            }),
        }
    }

    fn run_events(
        provider: &GeminiProvider,
        req: RunRequest,
    ) -> (Vec<ToolCallRequest>, Vec<RunEvent>) {
        let mut calls = Vec::new();
        let mut events = Vec::new();

        provider
            .run(
                req,
                &mut |call| {
                    calls.push(call.clone());
                    ToolResult::success(
                        call.call_id,
                        call.tool_name,
                        "- main.py: file_size=5 bytes, is_dir=false",
                    )
                },
                &mut |event| events.push(event),
            )
            .expect("run should not return provider-level failure");

        (calls, events)
    }

    #[test]
    fn profile_reports_gemini_provider_id_and_model() {
        let client = FakeContentClient::new(Vec::new());
        let provider = GeminiProvider::with_content_client_for_tests("  ", 5, client);

        let profile = provider.profile();
        assert_eq!(profile.provider_id, GEMINI_PROVIDER_ID);
        assert_eq!(profile.model_id, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn new_rejects_blank_api_key() {
        let error = match GeminiProvider::new(GeminiProviderConfig::new(" ", "m")) {
            Ok(_) => panic!("blank key must be rejected"),
            Err(error) => error,
        };
        assert!(error.message().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn run_without_function_calls_emits_text_and_finishes() {
        let client = FakeContentClient::new(vec![Ok(model_turn(vec![Part::text("Hello")]))]);
        let provider = GeminiProvider::with_content_client_for_tests(
            "gemini-test",
            5,
            Arc::clone(&client) as Arc<dyn ContentClient>,
        );

        let (calls, events) = run_events(&provider, request(Vec::new()));

        assert!(calls.is_empty());
        assert_eq!(
            events,
            vec![
                RunEvent::Started { run_id: 3 },
                RunEvent::Usage {
                    run_id: 3,
                    prompt_tokens: 10,
                    response_tokens: 4,
                },
                RunEvent::Text {
                    run_id: 3,
                    text: "Hello".to_string(),
                },
                RunEvent::Finished { run_id: 3 },
            ]
        );

        let observed = client.observed();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].0, "gemini-test");
        let system = observed[0].1.system_instruction.as_ref().expect("system");
        assert_eq!(
            system.parts[0].text.as_deref(),
            Some("You are a helpful AI coding agent.")
        );
    }

    #[test]
    fn run_executes_function_calls_and_feeds_results_back() {
        let client = FakeContentClient::new(vec![
            Ok(model_turn(vec![call_part(
                "list_directory",
                json!({"directory": "."}),
            )])),
            Ok(model_turn(vec![Part::text("There is main.py.")])),
        ]);
        let provider = GeminiProvider::with_content_client_for_tests(
            "gemini-test",
            5,
            Arc::clone(&client) as Arc<dyn ContentClient>,
        );

        let (calls, events) = run_events(&provider, request(vec![list_tool()]));

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "list_directory");
        assert_eq!(calls[0].call_id, "call-0-0");
        assert_eq!(calls[0].arguments, json!({"directory": "."}));

        assert!(events.iter().any(|event| matches!(
            event,
            RunEvent::ToolCallStarted { call, .. } if call.tool_name == "list_directory"
        )));
        assert!(events.iter().any(
            |event| matches!(event, RunEvent::ToolCallFinished { result, .. } if !result.is_error)
        ));
        assert_eq!(events.last(), Some(&RunEvent::Finished { run_id: 3 }));

        let observed = client.observed();
        assert_eq!(observed.len(), 2);
        let second = &observed[1].1.contents;
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role.as_deref(), Some("model"));
        assert!(second[1].parts[0].function_call.is_some());
        assert_eq!(second[2].role.as_deref(), Some("user"));
        let response = second[2].parts[0]
            .function_response
            .as_ref()
            .expect("function response part");
        assert_eq!(response.name, "list_directory");
        assert_eq!(
            response.response,
            json!({"result": "- main.py: file_size=5 bytes, is_dir=false"})
        );
    }

    #[test]
    fn run_sends_uppercase_schema_types_in_declarations() {
        let client = FakeContentClient::new(vec![Ok(model_turn(vec![Part::text("ok")]))]);
        let provider = GeminiProvider::with_content_client_for_tests(
            "gemini-test",
            5,
            Arc::clone(&client) as Arc<dyn ContentClient>,
        );

        run_events(&provider, request(vec![list_tool()]));

        let observed = client.observed();
        let declaration = &observed[0].1.tools[0].function_declarations[0];
        assert_eq!(
            declaration.parameters,
            Some(json!({
                "type": "OBJECT",
                "properties": {
                    "directory": {"type": "STRING", "description": "Relative path"}
                }
            }))
        );
    }

    #[test]
    fn run_fails_when_turn_limit_is_reached() {
        let client = FakeContentClient::new(vec![
            Ok(model_turn(vec![call_part("list_directory", json!({}))])),
            Ok(model_turn(vec![call_part("list_directory", json!({}))])),
        ]);
        let provider = GeminiProvider::with_content_client_for_tests("gemini-test", 2, client);

        let (calls, events) = run_events(&provider, request(vec![list_tool()]));

        assert_eq!(calls.len(), 2);
        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { run_id: 3, error }) if error.contains("maximum of 2 model turns")
        ));
    }

    #[test]
    fn run_maps_transport_error_to_failed_event() {
        let client = FakeContentClient::new(vec![Err(GeminiApiError::Unknown("boom".to_string()))]);
        let provider = GeminiProvider::with_content_client_for_tests("gemini-test", 5, client);

        let (_, events) = run_events(&provider, request(Vec::new()));

        assert_eq!(events.first(), Some(&RunEvent::Started { run_id: 3 }));
        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { run_id: 3, error }) if error.contains("boom")
        ));
    }

    #[test]
    fn run_without_candidates_fails() {
        let client = FakeContentClient::new(vec![Ok(GenerateContentResponse::default())]);
        let provider = GeminiProvider::with_content_client_for_tests("gemini-test", 5, client);

        let (_, events) = run_events(&provider, request(Vec::new()));

        assert!(matches!(
            events.last(),
            Some(RunEvent::Failed { error, .. }) if error.contains("no content")
        ));
    }

    #[test]
    fn history_groups_tool_exchange_by_role() {
        let contents = history_to_contents(&[
            RunMessage::UserText {
                text: "run it".to_string(),
            },
            RunMessage::ToolCall {
                call_id: "c1".to_string(),
                tool_name: "run_script".to_string(),
                arguments: json!({"file_path": "main.py"}),
            },
            RunMessage::ToolResult {
                call_id: "c1".to_string(),
                tool_name: "run_script".to_string(),
                content: json!("Error: Execution timed out after 30s"),
                is_error: true,
            },
            RunMessage::AssistantText {
                text: "It timed out.".to_string(),
            },
        ]);

        assert_eq!(contents.len(), 4);
        assert_eq!(contents[0].parts.len(), 1);
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(
            contents[2].parts[0]
                .function_response
                .as_ref()
                .map(|response| response.response.clone()),
            Some(json!({"error": "Error: Execution timed out after 30s"}))
        );
        assert_eq!(contents[3].role.as_deref(), Some("model"));
    }
}
