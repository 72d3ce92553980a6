//! Stateful remote console client.
//!
//! Exactly one command is in flight at a time: every entry point takes
//! `&mut self`, so a second command cannot be issued before the first
//! resolves. A transport fault tears the socket down and the next command
//! reconnects before proceeding.

use crate::error::{RconError, RconResult};
use crate::frame::Frame;
use crate::report::{CommandResult, ErrorKind, ExecutionReport, FailureEntry};
use std::fmt;
use std::time::Duration;
use stratavox_build::{BlockType, CommandScript};
use stratavox_geo::VoxelPoint;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};

/// Backoff delays stop growing past this point.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct RconConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret sent in the login frame.
    pub secret: String,
    /// Per-attempt socket deadline.
    pub timeout: Duration,
    /// Transport-level retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between retries, doubled per attempt.
    pub base_delay: Duration,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 25575,
            secret: String::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Not connected.
    Disconnected,
    /// Dialing the remote console.
    Connecting,
    /// Socket open, login frame in flight.
    Authenticating,
    /// Session established, no command in flight.
    Ready,
    /// A command round trip is in progress.
    Executing,
    /// The connection broke; the next command reconnects.
    Faulted,
    /// Closed by the caller.
    Closed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Ready => write!(f, "Ready"),
            Self::Executing => write!(f, "Executing"),
            Self::Faulted => write!(f, "Faulted"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Remote console client over a single persistent TCP connection.
#[derive(Debug)]
pub struct RconClient {
    config: RconConfig,
    stream: Option<TcpStream>,
    state: ClientState,
    next_id: i32,
}

impl RconClient {
    pub fn new(config: RconConfig) -> Self {
        Self {
            config,
            stream: None,
            state: ClientState::Disconnected,
            next_id: 1,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Dials the remote console and authenticates with the shared secret.
    ///
    /// A response whose id does not echo the login id (servers answer a bad
    /// secret with id −1) is an authentication failure: fatal, never retried.
    pub async fn connect(&mut self) -> RconResult<()> {
        self.stream = None;
        self.state = ClientState::Connecting;

        let address = format!("{}:{}", self.config.host, self.config.port);
        let mut stream = match timeout(self.config.timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                self.state = ClientState::Faulted;
                return Err(RconError::Connection(format!(
                    "failed to connect to {address}: {err}"
                )));
            }
            Err(_) => {
                self.state = ClientState::Faulted;
                return Err(RconError::Timeout);
            }
        };

        self.state = ClientState::Authenticating;
        let id = self.take_id();
        let login = Frame::login(id, &self.config.secret);
        let exchange = async {
            login.write_to(&mut stream).await?;
            Frame::read_from(&mut stream).await
        };
        let response = match timeout(self.config.timeout, exchange).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(err)) => {
                self.state = ClientState::Faulted;
                return Err(err);
            }
            Err(_) => {
                self.state = ClientState::Faulted;
                return Err(RconError::Timeout);
            }
        };
        if response.id != id {
            self.state = ClientState::Faulted;
            return Err(RconError::Auth);
        }

        tracing::info!("remote console session established with {}", address);
        self.stream = Some(stream);
        self.state = ClientState::Ready;
        Ok(())
    }

    /// Executes one command. Transport failures are retried with exponential
    /// backoff up to `max_retries`; after exhaustion the failure is returned
    /// as a failed result, never an error or panic.
    pub async fn execute(&mut self, command: &str) -> CommandResult {
        self.execute_inner(command, None).await
    }

    /// Like [`execute`](Self::execute), but gives up (with a failed result)
    /// once `deadline` passes. The deadline is checked cooperatively between
    /// retry attempts, not mid-flight.
    pub async fn execute_with_deadline(&mut self, command: &str, deadline: Instant) -> CommandResult {
        self.execute_inner(command, Some(deadline)).await
    }

    /// Renders and executes a `fill` command; the result carries the parsed
    /// block count when the response reports one.
    pub async fn execute_fill(
        &mut self,
        min: VoxelPoint,
        max: VoxelPoint,
        block: &BlockType,
        replace: Option<&BlockType>,
    ) -> CommandResult {
        let mut text = format!("fill {min} {max} {block}");
        if let Some(replaced) = replace {
            text.push_str(&format!(" replace {replaced}"));
        }
        self.execute(&text).await
    }

    /// Renders and executes a `gamerule` query or assignment; query results
    /// carry the parsed value.
    pub async fn execute_gamerule(&mut self, name: &str, value: Option<&str>) -> CommandResult {
        let text = match value {
            Some(value) => format!("gamerule {name} {value}"),
            None => format!("gamerule {name}"),
        };
        self.execute(&text).await
    }

    /// Executes a script sequentially. Non-critical failures are recorded and
    /// execution continues; a failed critical command aborts the remainder.
    pub async fn execute_batch(&mut self, script: &CommandScript) -> ExecutionReport {
        let started = Instant::now();
        let mut commands_executed = 0;
        let mut blocks_affected_total = 0u64;
        let mut failures = Vec::new();

        for entry in script {
            let text = entry.command.to_text();
            let result = self.execute(&text).await;
            commands_executed += 1;
            blocks_affected_total += result.blocks_affected.unwrap_or(0);

            if !result.success {
                let reason = match result.error {
                    Some(kind) if result.raw_response.is_empty() => kind.to_string(),
                    Some(kind) => format!("{kind}: {}", result.raw_response),
                    None => result.raw_response.clone(),
                };
                failures.push(FailureEntry {
                    command: text,
                    error: reason,
                });
                if entry.critical {
                    tracing::error!("critical command failed, aborting script");
                    break;
                }
            }
        }

        let report = ExecutionReport {
            success: failures.is_empty(),
            commands_executed,
            blocks_affected_total,
            failures,
            elapsed_total: started.elapsed(),
        };
        tracing::info!(
            "script finished: {}/{} commands, {} blocks affected, {} failures",
            report.commands_executed,
            script.len(),
            report.blocks_affected_total,
            report.failures.len()
        );
        report
    }

    /// Gracefully shuts the connection down.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.state = ClientState::Closed;
        tracing::debug!("remote console session closed");
    }

    async fn execute_inner(&mut self, command: &str, deadline: Option<Instant>) -> CommandResult {
        let started = Instant::now();
        let mut last_error = ErrorKind::Connection;
        let mut last_detail = String::from("no attempt made");

        for attempt in 0..=self.config.max_retries {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    last_error = ErrorKind::Timeout;
                    last_detail = String::from("deadline exceeded");
                    break;
                }
            }
            if attempt > 0 {
                let delay = self.backoff_delay(attempt - 1);
                if let Some(deadline) = deadline {
                    if Instant::now() + delay >= deadline {
                        last_error = ErrorKind::Timeout;
                        last_detail = String::from("deadline exceeded");
                        break;
                    }
                }
                tracing::debug!("retry {} for command after {:?}", attempt, delay);
                tokio::time::sleep(delay).await;
            }

            if self.stream.is_none() {
                match self.connect().await {
                    Ok(()) => {}
                    Err(err @ RconError::Auth) => {
                        // A rejected secret cannot succeed on retry.
                        return CommandResult::failed(
                            ErrorKind::Auth,
                            err.to_string(),
                            started.elapsed(),
                        );
                    }
                    Err(err) => {
                        tracing::warn!("connection attempt failed: {}", err);
                        last_error = error_kind(&err);
                        last_detail = err.to_string();
                        continue;
                    }
                }
            }

            self.state = ClientState::Executing;
            match self.round_trip(command).await {
                Ok(raw) => {
                    self.state = ClientState::Ready;
                    let result = CommandResult::from_response(raw, started.elapsed());
                    if !result.success {
                        // Semantically invalid commands cannot succeed on
                        // retry either; record and move on.
                        tracing::warn!(
                            "command rejected by environment: {:?}",
                            result.raw_response
                        );
                    }
                    return result;
                }
                Err(err) => {
                    tracing::warn!("command transport failed: {}", err);
                    last_error = error_kind(&err);
                    last_detail = err.to_string();
                    self.fault();
                }
            }
        }

        CommandResult::failed(last_error, last_detail, started.elapsed())
    }

    async fn round_trip(&mut self, command: &str) -> RconResult<String> {
        let id = self.take_id();
        let per_attempt = self.config.timeout;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| RconError::Connection("not connected".to_string()))?;

        let frame = Frame::command(id, command);
        let exchange = async {
            frame.write_to(stream).await?;
            Frame::read_from(stream).await
        };
        let response = timeout(per_attempt, exchange)
            .await
            .map_err(|_| RconError::Timeout)??;

        if response.id != id {
            return Err(RconError::Protocol(format!(
                "response id {} does not match request id {}",
                response.id, id
            )));
        }
        Ok(response.payload)
    }

    fn take_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id <= 0 {
            self.next_id = 1;
        }
        id
    }

    fn backoff_delay(&self, retry: u32) -> Duration {
        let millis = (self.config.base_delay.as_millis() as u64)
            .saturating_mul(2u64.saturating_pow(retry));
        Duration::from_millis(millis.min(MAX_BACKOFF_MS))
    }

    fn fault(&mut self) {
        self.stream = None;
        self.state = ClientState::Faulted;
    }
}

fn error_kind(err: &RconError) -> ErrorKind {
    match err {
        RconError::Connection(_) | RconError::Io(_) => ErrorKind::Connection,
        RconError::Auth => ErrorKind::Auth,
        RconError::Timeout => ErrorKind::Timeout,
        RconError::Protocol(_) => ErrorKind::Protocol,
    }
}
