use std::sync::Arc;

use agent_provider::RunProvider;
use agent_provider_gemini::{GeminiProvider, GeminiProviderConfig, GEMINI_PROVIDER_ID};
use agent_provider_mock::{MockProvider, MOCK_PROVIDER_ID};

use crate::config::AgentConfig;

pub const AVAILABLE_PROVIDERS: [&str; 2] = [GEMINI_PROVIDER_ID, MOCK_PROVIDER_ID];

pub fn provider_from_config(config: &AgentConfig) -> Result<Arc<dyn RunProvider>, String> {
    match config.provider_id.as_str() {
        GEMINI_PROVIDER_ID => {
            let mut provider_config = GeminiProviderConfig::new(
                config.api_key.clone().unwrap_or_default(),
                config.model_id.clone(),
            )
            .with_max_turns(config.max_turns);

            if let Some(base_url) = &config.base_url {
                provider_config = provider_config.with_base_url(base_url.clone());
            }

            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }

            let provider =
                GeminiProvider::new(provider_config).map_err(|error| error.to_string())?;
            Ok(Arc::new(provider))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {}",
            AVAILABLE_PROVIDERS.join(", ")
        )),
    }
}
