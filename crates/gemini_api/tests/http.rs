use std::time::Duration;

use gemini_api::{
    generate_content_url, Content, GeminiApiClient, GeminiApiConfig, GenerateContentRequest, Part,
};

#[test]
fn http_request_targets_generate_content_endpoint() {
    let config = GeminiApiConfig::new("key")
        .with_base_url("https://example.test")
        .with_timeout(Duration::from_secs(5));
    let client = GeminiApiClient::new(config).expect("client");
    let request = GenerateContentRequest::new(vec![Content::user(vec![Part::text("payload")])]);

    let http_request = client
        .build_request("gemini-2.0-flash-001", &request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request.url().as_str(),
        generate_content_url("https://example.test", "v1beta", "gemini-2.0-flash-001")
            .expect("url")
    );
    assert_eq!(http_request.method(), "POST");
    assert_eq!(http_request.headers()["x-goog-api-key"], "key");

    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body");
    let body: serde_json::Value = serde_json::from_slice(body).expect("body json");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "payload");
}

#[test]
fn http_request_honors_custom_api_version() {
    let config = GeminiApiConfig::new("key")
        .with_base_url("https://example.test/")
        .with_api_version("v1");
    let client = GeminiApiClient::new(config).expect("client");

    assert_eq!(
        client.endpoint("m").expect("endpoint"),
        "https://example.test/v1/models/m:generateContent"
    );
}
