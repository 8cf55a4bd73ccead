use ::url::Url;

use crate::error::GeminiApiError;

/// Default base URL for Gemini requests.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default API version segment.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Build the `generateContent` endpoint for `model`.
///
/// Normalization rules:
/// 1) a blank base URL falls back to [`DEFAULT_GEMINI_BASE_URL`]
/// 2) trailing slashes are dropped, and the version segment is not repeated
///    when the base already ends with it
/// 3) a `models/` prefix on the model id is tolerated
pub fn generate_content_url(
    base_url: &str,
    api_version: &str,
    model: &str,
) -> Result<String, GeminiApiError> {
    let base = if base_url.trim().is_empty() {
        DEFAULT_GEMINI_BASE_URL
    } else {
        base_url.trim()
    };

    let parsed = Url::parse(base)
        .map_err(|error| GeminiApiError::InvalidBaseUrl(format!("{base}: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GeminiApiError::InvalidBaseUrl(format!(
            "{base}: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    let model = model.trim();
    let model = model.strip_prefix("models/").unwrap_or(model);
    if model.is_empty() || model.contains('/') {
        return Err(GeminiApiError::InvalidModel(model.to_string()));
    }

    let version = api_version.trim().trim_matches('/');
    let version = if version.is_empty() {
        DEFAULT_API_VERSION
    } else {
        version
    };

    let trimmed = base.trim_end_matches('/');
    let prefix = if trimmed.ends_with(&format!("/{version}")) {
        trimmed.to_string()
    } else {
        format!("{trimmed}/{version}")
    };

    Ok(format!("{prefix}/models/{model}:generateContent"))
}
