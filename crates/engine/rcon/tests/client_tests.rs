//! Client behavior against a mock remote console on a loopback socket.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stratavox_build::{BuildCommand, CommandScript};
use stratavox_rcon::{ClientState, ErrorKind, Frame, RconClient, RconConfig, RconError};
use tokio::net::TcpListener;

const SECRET: &str = "hunter2";

/// What the mock answers to a command, given its text.
type Responder = fn(&str) -> Option<String>;

struct MockConsole {
    port: u16,
    auth_attempts: Arc<AtomicU32>,
    commands: Arc<Mutex<Vec<String>>>,
}

/// Serves the wire protocol on an ephemeral loopback port. Connections are
/// handled sequentially, matching the client's single-connection model.
async fn spawn_mock(respond: Responder) -> MockConsole {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let auth_attempts = Arc::new(AtomicU32::new(0));
    let commands = Arc::new(Mutex::new(Vec::new()));

    let auths = auth_attempts.clone();
    let log = commands.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            loop {
                let frame = match Frame::read_from(&mut socket).await {
                    Ok(frame) => frame,
                    Err(_) => break,
                };
                if frame.kind == Frame::LOGIN {
                    auths.fetch_add(1, Ordering::SeqCst);
                    let id = if frame.payload == SECRET { frame.id } else { -1 };
                    let reply = Frame {
                        id,
                        kind: Frame::COMMAND,
                        payload: String::new(),
                    };
                    if reply.write_to(&mut socket).await.is_err() {
                        break;
                    }
                } else {
                    log.lock().unwrap().push(frame.payload.clone());
                    if let Some(text) = respond(&frame.payload) {
                        let reply = Frame {
                            id: frame.id,
                            kind: Frame::RESPONSE,
                            payload: text,
                        };
                        if reply.write_to(&mut socket).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    MockConsole {
        port,
        auth_attempts,
        commands,
    }
}

fn client_for(mock: &MockConsole) -> RconClient {
    RconClient::new(RconConfig {
        host: "127.0.0.1".to_string(),
        port: mock.port,
        secret: SECRET.to_string(),
        timeout: Duration::from_millis(200),
        max_retries: 1,
        base_delay: Duration::from_millis(10),
    })
}

#[tokio::test]
async fn test_fill_round_trip_parses_block_count() {
    let mock = spawn_mock(|cmd| {
        assert!(cmd.starts_with("fill "));
        Some("Successfully filled 1234 blocks".to_string())
    })
    .await;
    let mut client = client_for(&mock);

    client.connect().await.unwrap();
    assert_eq!(client.state(), ClientState::Ready);

    let result = client
        .execute_fill(
            stratavox_geo::VoxelPoint::new(0, 60, 0),
            stratavox_geo::VoxelPoint::new(4, 60, 4),
            &"stone".parse().unwrap(),
            None,
        )
        .await;
    assert!(result.success);
    assert_eq!(result.blocks_affected, Some(1234));
    assert_eq!(result.error, None);

    client.close().await;
    assert_eq!(client.state(), ClientState::Closed);
}

#[tokio::test]
async fn test_bad_secret_is_fatal_and_not_retried() {
    let mock = spawn_mock(|_| Some("ok".to_string())).await;
    let mut client = RconClient::new(RconConfig {
        host: "127.0.0.1".to_string(),
        port: mock.port,
        secret: "wrong".to_string(),
        timeout: Duration::from_millis(200),
        max_retries: 3,
        base_delay: Duration::from_millis(10),
    });

    assert!(matches!(client.connect().await, Err(RconError::Auth)));
    assert_eq!(client.state(), ClientState::Faulted);

    // Driving a command through the faulted client reconnects once, hits the
    // same rejection, and fails without burning retries on it.
    let result = client.execute("say hello").await;
    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::Auth));
    assert_eq!(mock.auth_attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_surfaces_as_failed_result() {
    // Authenticates fine, then swallows every command.
    let mock = spawn_mock(|_| None).await;
    let mut client = client_for(&mock);

    let result = client.execute("say anyone there").await;
    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::Timeout));
    // First attempt plus one retry, each over a fresh connection.
    assert_eq!(mock.auth_attempts.load(Ordering::SeqCst), 2);
    assert_eq!(client.state(), ClientState::Faulted);
}

#[tokio::test]
async fn test_semantic_failure_is_not_retried() {
    let mock = spawn_mock(|_| Some("Error: Unknown block type: invalid_block".to_string())).await;
    let mut client = client_for(&mock);

    let result = client.execute("setblock 0 0 0 invalid_block").await;
    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::Command));
    assert_eq!(mock.commands.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_deadline_bounds_retries() {
    let mock = spawn_mock(|_| None).await;
    let mut client = RconClient::new(RconConfig {
        host: "127.0.0.1".to_string(),
        port: mock.port,
        secret: SECRET.to_string(),
        timeout: Duration::from_millis(100),
        max_retries: 50,
        base_delay: Duration::from_millis(50),
    });

    let deadline = tokio::time::Instant::now() + Duration::from_millis(300);
    let result = client.execute_with_deadline("say slow", deadline).await;
    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::Timeout));
    // Nowhere near the 50 configured retries fit inside the deadline.
    assert!(mock.auth_attempts.load(Ordering::SeqCst) < 6);
}

#[tokio::test]
async fn test_batch_continues_after_noncritical_failure() {
    let mock = spawn_mock(|cmd| {
        if cmd.contains("lava") {
            Some("Error: that block is protected".to_string())
        } else {
            Some("Done".to_string())
        }
    })
    .await;
    let mut client = client_for(&mock);

    let mut script = CommandScript::new();
    script.push(BuildCommand::Raw("say one".to_string()));
    script.push(BuildCommand::Raw("setblock 0 0 0 lava".to_string()));
    script.push(BuildCommand::Raw("say three".to_string()));

    let report = client.execute_batch(&script).await;
    assert!(!report.success);
    assert_eq!(report.commands_executed, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].command, "setblock 0 0 0 lava");
}

#[tokio::test]
async fn test_batch_aborts_after_critical_failure() {
    let mock = spawn_mock(|cmd| {
        if cmd.contains("air") {
            Some("Error: fill limit exceeded".to_string())
        } else {
            Some("Done".to_string())
        }
    })
    .await;
    let mut client = client_for(&mock);

    let mut script = CommandScript::new();
    script.push_critical(BuildCommand::Raw("fill 0 0 0 9 9 9 air".to_string()));
    script.push(BuildCommand::Raw("say never reached".to_string()));

    let report = client.execute_batch(&script).await;
    assert!(!report.success);
    assert_eq!(report.commands_executed, 1);
    assert_eq!(mock.commands.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_connection_refused_retries_then_fails() {
    // Bind then drop to get a port nobody is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut client = RconClient::new(RconConfig {
        host: "127.0.0.1".to_string(),
        port,
        secret: SECRET.to_string(),
        timeout: Duration::from_millis(100),
        max_retries: 2,
        base_delay: Duration::from_millis(10),
    });

    let result = client.execute("say hello").await;
    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::Connection));
}
