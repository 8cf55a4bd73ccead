//! One-shot coding agent: a model provider plus the sandboxed operations.
//!
//! ## Provider selection
//!
//! - `CODING_AGENT_PROVIDER=gemini` (default) calls the Gemini API and needs
//!   `GEMINI_API_KEY`.
//! - `CODING_AGENT_PROVIDER=mock` replays a fixed script for offline runs.
//!
//! Other knobs: `CODING_AGENT_MODEL`, `GEMINI_API_BASE_URL`,
//! `CODING_AGENT_TIMEOUT_SEC`, `CODING_AGENT_MAX_TURNS` and
//! `CODING_AGENT_SYSTEM_INSTRUCTIONS`. A `.env` file in the current directory
//! is loaded first.
//!
//! The model only ever sees relative paths. Every tool call is executed by an
//! `agent_sandbox::Dispatcher` rooted at `--working-dir`.

pub mod config;
pub mod providers;
pub mod runner;
pub mod tools;
