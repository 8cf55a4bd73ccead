use gemini_api::{
    Content, FunctionCall, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    Part,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn payload_request_serializes_camel_case_fields() {
    let request = GenerateContentRequest::new(vec![Content::user(vec![Part::text("hi")])])
        .with_system_instruction("be brief")
        .with_function_declarations(vec![FunctionDeclaration {
            name: "read_file".to_string(),
            description: Some("Read a file".to_string()),
            parameters: Some(json!({"type": "OBJECT"})),
        }]);

    let value = serde_json::to_value(&request).expect("serialize request");
    assert_eq!(
        value,
        json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "tools": [{
                "functionDeclarations": [{
                    "name": "read_file",
                    "description": "Read a file",
                    "parameters": {"type": "OBJECT"}
                }]
            }],
            "toolConfig": {"functionCallingConfig": {"mode": "AUTO"}}
        })
    );
}

#[test]
fn payload_blank_instruction_and_no_tools_are_omitted() {
    let request = GenerateContentRequest::new(vec![Content::user(vec![Part::text("hi")])])
        .with_system_instruction("   ")
        .with_function_declarations(Vec::new());

    let value = serde_json::to_value(&request).expect("serialize request");
    assert_eq!(
        value,
        json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
    );
}

#[test]
fn payload_function_parts_use_api_field_names() {
    let content = Content::model(vec![Part::function_call(FunctionCall {
        name: "list_directory".to_string(),
        args: json!({"directory": "pkg"}),
        id: None,
    })]);
    let response = Content::user(vec![Part::function_response(
        "list_directory",
        json!({"result": "- a.txt: file_size=3 bytes, is_dir=false"}),
    )]);

    assert_eq!(
        serde_json::to_value(&content).expect("serialize call"),
        json!({
            "role": "model",
            "parts": [{"functionCall": {"name": "list_directory", "args": {"directory": "pkg"}}}]
        })
    );
    assert_eq!(
        serde_json::to_value(&response).expect("serialize response"),
        json!({
            "role": "user",
            "parts": [{
                "functionResponse": {
                    "name": "list_directory",
                    "response": {"result": "- a.txt: file_size=3 bytes, is_dir=false"}
                }
            }]
        })
    );
}

#[test]
fn payload_response_helpers_read_first_candidate() {
    let body = r#"{
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"text": "Looking "},
                    {"functionCall": {"name": "read_file", "args": {"file_path": "main.py"}}},
                    {"text": "now."}
                ]
            },
            "finishReason": "STOP",
            "safetyRatings": []
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17},
        "modelVersion": "gemini-2.0-flash-001"
    }"#;

    let response: GenerateContentResponse = serde_json::from_str(body).expect("parse response");
    assert_eq!(response.text().as_deref(), Some("Looking now."));
    assert_eq!(response.finish_reason(), Some("STOP"));

    let calls = response.function_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "read_file");
    assert_eq!(calls[0].args, json!({"file_path": "main.py"}));

    let usage = response.usage_metadata.expect("usage");
    assert_eq!(usage.prompt_token_count, 12);
    assert_eq!(usage.candidates_token_count, 5);
}

#[test]
fn payload_response_without_candidates_has_no_text_or_calls() {
    let response: GenerateContentResponse =
        serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .expect("parse response");

    assert_eq!(response.text(), None);
    assert!(response.function_calls().is_empty());
    assert_eq!(response.usage_metadata, None);
}
