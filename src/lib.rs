//! Path-confined file-system operations for a coding agent.
//!
//! Invariant: no operation reads, lists, writes, or executes outside the
//! [`WorkingDirectory`] it was given. Every path argument goes through
//! [`WorkingDirectory::resolve`] before the filesystem is touched.
//!
//! # Public API Overview
//! - [`Dispatcher`] maps an operation name and JSON arguments to one of the
//!   four operations and returns a [`ToolOutput`]. Failures are plain text
//!   starting with `Error: `.
//! - [`ops`] exposes the operations directly for callers that already hold
//!   typed arguments.
//! - [`SandboxConfig`] carries read/output limits, the script timeout, and the
//!   extension-to-interpreter table.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod logging;
pub mod ops;

pub use crate::config::SandboxConfig;
pub use crate::dispatch::{Dispatcher, ToolCall, ToolOutput, ERROR_PREFIX, OPERATION_NAMES};
pub use crate::error::ToolError;
pub use crate::guard::{GuardError, RootError, WorkingDirectory};
pub use crate::logging::init_logging;
