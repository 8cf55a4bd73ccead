//! Sandbox limits and the interpreter table.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_READ_CHARS: usize = 10_000;
pub const DEFAULT_SCRIPT_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024;

pub const MAX_READ_CHARS_ENV_VAR: &str = "AGENT_SANDBOX_MAX_READ_CHARS";
pub const SCRIPT_TIMEOUT_ENV_VAR: &str = "AGENT_SANDBOX_SCRIPT_TIMEOUT_SEC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Characters returned by `read_file` before the truncation marker.
    pub max_read_chars: usize,
    /// Wall-clock limit for `run_script`.
    pub script_timeout: Duration,
    /// Per-stream cap on captured script output.
    pub max_output_bytes: usize,
    /// Script extension (without the dot) to interpreter program.
    pub interpreters: BTreeMap<String, String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let interpreters = [("py", "python3"), ("sh", "sh")]
            .into_iter()
            .map(|(extension, program)| (extension.to_string(), program.to_string()))
            .collect();

        Self {
            max_read_chars: DEFAULT_MAX_READ_CHARS,
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SEC),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            interpreters,
        }
    }
}

impl SandboxConfig {
    /// Defaults overridden by `AGENT_SANDBOX_*` variables. Blank or
    /// unparsable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(max_read_chars) =
            env_parse::<usize>(MAX_READ_CHARS_ENV_VAR).filter(|v| *v > 0)
        {
            config.max_read_chars = max_read_chars;
        }

        if let Some(seconds) = env_parse::<u64>(SCRIPT_TIMEOUT_ENV_VAR).filter(|v| *v > 0) {
            config.script_timeout = Duration::from_secs(seconds);
        }

        config
    }

    #[must_use]
    pub fn with_max_read_chars(mut self, max_read_chars: usize) -> Self {
        self.max_read_chars = max_read_chars;
        self
    }

    #[must_use]
    pub fn with_script_timeout(mut self, script_timeout: Duration) -> Self {
        self.script_timeout = script_timeout;
        self
    }

    #[must_use]
    pub fn with_interpreter(
        mut self,
        extension: impl Into<String>,
        program: impl Into<String>,
    ) -> Self {
        let extension = extension.into();
        self.interpreters
            .insert(extension.trim_start_matches('.').to_string(), program.into());
        self
    }

    pub fn interpreter_for(&self, extension: &str) -> Option<&str> {
        self.interpreters.get(extension).map(String::as_str)
    }

    /// Comma-separated `.ext` list used in "unsupported script" messages.
    pub fn supported_extensions(&self) -> String {
        self.interpreters
            .keys()
            .map(|extension| format!(".{extension}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}
