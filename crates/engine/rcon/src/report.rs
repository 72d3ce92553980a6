//! Command results and execution reports.

use crate::classify;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Coarse failure classification carried on a failed [`CommandResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Socket refused, reset, or otherwise unusable.
    Connection,
    /// The remote console rejected the shared secret.
    Auth,
    /// No response within the deadline, retries exhausted.
    Timeout,
    /// The environment returned recognizable failure text.
    Command,
    /// The peer violated the wire protocol.
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "connection",
            Self::Auth => "auth",
            Self::Timeout => "timeout",
            Self::Command => "command",
            Self::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// Outcome of one executed command. Failures are values, never panics or
/// errors past the call boundary, so batch execution can continue.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub success: bool,
    pub raw_response: String,
    /// Block count parsed from fill/setblock responses.
    pub blocks_affected: Option<u64>,
    /// Value parsed from gamerule query responses.
    pub parsed_value: Option<String>,
    pub error: Option<ErrorKind>,
    #[serde(serialize_with = "duration_secs")]
    pub elapsed: Duration,
}

impl CommandResult {
    /// Classifies a raw response into a result.
    pub fn from_response(raw_response: String, elapsed: Duration) -> Self {
        let success = classify::is_success(&raw_response);
        Self {
            success,
            blocks_affected: classify::blocks_affected(&raw_response),
            parsed_value: classify::gamerule_value(&raw_response),
            error: (!success).then_some(ErrorKind::Command),
            raw_response,
            elapsed,
        }
    }

    /// A transport-level failure that never produced a usable response.
    pub fn failed(error: ErrorKind, detail: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            raw_response: detail.into(),
            blocks_affected: None,
            parsed_value: None,
            error: Some(error),
            elapsed,
        }
    }
}

/// One failed command within a script.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub command: String,
    pub error: String,
}

/// Aggregated outcome of a [`CommandScript`](stratavox_build::CommandScript)
/// execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    pub commands_executed: usize,
    pub blocks_affected_total: u64,
    pub failures: Vec<FailureEntry>,
    #[serde(serialize_with = "duration_secs")]
    pub elapsed_total: Duration,
}

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
