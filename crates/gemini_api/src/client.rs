use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use crate::config::GeminiApiConfig;
use crate::error::{parse_error_message, GeminiApiError};
use crate::payload::{GenerateContentRequest, GenerateContentResponse};
use crate::url::generate_content_url;

pub const HEADER_API_KEY: &str = "x-goog-api-key";

#[derive(Debug)]
pub struct GeminiApiClient {
    http: Client,
    config: GeminiApiConfig,
}

impl GeminiApiClient {
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiApiConfig {
        &self.config
    }

    pub fn endpoint(&self, model: &str) -> Result<String, GeminiApiError> {
        generate_content_url(&self.config.base_url, &self.config.api_version, model)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, GeminiApiError> {
        let api_key = self.config.api_key.trim();
        if api_key.is_empty() {
            return Err(GeminiApiError::MissingApiKey);
        }

        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|_| GeminiApiError::InvalidHeader(HEADER_API_KEY))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_API_KEY, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub fn build_request(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::RequestBuilder, GeminiApiError> {
        let headers = self.build_headers()?;
        Ok(self
            .http
            .post(self.endpoint(model)?)
            .headers(headers)
            .json(request))
    }

    /// Sends one request and decodes the response. Non-2xx statuses become
    /// [`GeminiApiError::Status`] with the server's message.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        tracing::debug!(
            model,
            contents = request.contents.len(),
            tools = request.tools.len(),
            "sending generateContent request"
        );

        let response = self.build_request(model, request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = parse_error_message(status, &body);
            tracing::warn!(%status, %message, "generateContent request failed");
            return Err(GeminiApiError::Status { status, message });
        }

        let decoded: GenerateContentResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            candidates = decoded.candidates.len(),
            function_calls = decoded.function_calls().len(),
            "received generateContent response"
        );
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeminiApiClient, HEADER_API_KEY};
    use crate::config::GeminiApiConfig;
    use crate::error::GeminiApiError;

    #[test]
    fn headers_require_api_key() {
        let client = GeminiApiClient::new(GeminiApiConfig::new("   ")).expect("client");
        assert!(matches!(
            client.build_headers(),
            Err(GeminiApiError::MissingApiKey)
        ));
    }

    #[test]
    fn headers_carry_trimmed_api_key_marked_sensitive() {
        let client = GeminiApiClient::new(GeminiApiConfig::new(" key-123 ")).expect("client");
        let headers = client.build_headers().expect("headers");

        let api_key = headers.get(HEADER_API_KEY).expect("api key header");
        assert_eq!(api_key, "key-123");
        assert!(api_key.is_sensitive());
        assert_eq!(headers["content-type"], "application/json");
    }
}
