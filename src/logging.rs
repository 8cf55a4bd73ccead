//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with the agent's answer on stdout.
//! `RUST_LOG` wins when set; otherwise only warnings are shown, or debug
//! output for the agent's own crates with `verbose`.

use tracing_subscriber::EnvFilter;

const AGENT_CRATES: [&str; 5] = [
    "agent_sandbox",
    "agent_provider_gemini",
    "agent_provider_mock",
    "gemini_api",
    "coding_agent",
];

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> String {
    if !verbose {
        return "warn".to_string();
    }

    let mut directives = vec!["warn".to_string()];
    directives.extend(AGENT_CRATES.iter().map(|target| format!("{target}=debug")));
    directives.join(",")
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
