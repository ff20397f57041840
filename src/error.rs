//! Typed failures surfaced to MCP callers.
//!
//! Every operation returns one of these kinds directly — nothing is retried
//! and nothing is wrapped in opaque strings until it crosses the wire.
//! A non-zero exit code from `ansible-playbook` is NOT an error: it is
//! reported as data inside the tool result.

use std::path::PathBuf;

/// Error kinds for every exposed operation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A resolved path landed outside the permitted sandbox base.
    #[error("path escapes allowed base: {} not within {}", .candidate.display(), .base.display())]
    PathEscape { candidate: PathBuf, base: PathBuf },

    /// A referenced file, playbook, inventory, or sample does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed structured input (bad JSON, invalid enumerated choice,
    /// missing or mistyped parameter).
    #[error("invalid input: {0}")]
    Validation(String),

    /// File content is not valid UTF-8 where text was required.
    #[error("not valid UTF-8 text: {0}")]
    Encoding(String),

    /// The subprocess exceeded its allotted time and was terminated.
    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The subprocess could not be started at all.
    #[error("failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    /// Any other filesystem failure (permissions, I/O).
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// JSON-RPC error code for this kind.
    ///
    /// Validation maps onto the standard "invalid params" code; the other
    /// kinds use codes from the server-defined range so callers can branch
    /// on them without parsing messages.
    pub fn code(&self) -> i64 {
        match self {
            ToolError::PathEscape { .. } => -32001,
            ToolError::NotFound(_) => -32002,
            ToolError::Validation(_) => -32602,
            ToolError::Encoding(_) => -32003,
            ToolError::Timeout { .. } => -32004,
            ToolError::Launch { .. } => -32005,
            ToolError::Io { .. } => -32006,
        }
    }

    /// Short machine-readable name, included in the error payload's `data`.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::PathEscape { .. } => "path_escape",
            ToolError::NotFound(_) => "not_found",
            ToolError::Validation(_) => "validation",
            ToolError::Encoding(_) => "encoding",
            ToolError::Timeout { .. } => "timeout",
            ToolError::Launch { .. } => "launch",
            ToolError::Io { .. } => "io",
        }
    }
}
