//! Remote console client for Stratavox.
//!
//! This crate provides:
//! - Length-prefixed binary wire framing (login / command / response)
//! - Case-insensitive response classification
//! - A stateful client with per-attempt timeouts, exponential backoff,
//!   reconnect-on-fault, and cooperative deadlines
//! - Batch execution producing structured execution reports

pub mod classify;
pub mod client;
pub mod error;
pub mod frame;
pub mod report;

pub use client::{ClientState, RconClient, RconConfig};
pub use error::{RconError, RconResult};
pub use frame::Frame;
pub use report::{CommandResult, ErrorKind, ExecutionReport, FailureEntry};
