//! Environment reset orchestration.
//!
//! A reset walks three steps through one client: clear the build area, lock
//! the world time-of-day, and teleport occupants to the safe point. Each
//! step has its own bounded deadline; an overrunning step is recorded as
//! timed out and the remaining steps still execute, so the whole reset
//! finishes within a bounded ceiling.

use serde::Serialize;
use std::time::Duration;
use stratavox_geo::VoxelPoint;
use stratavox_rcon::{CommandResult, ErrorKind, RconClient};
use tokio::time::Instant;

const CLEAR_DEADLINE: Duration = Duration::from_secs(15);
const TIME_DEADLINE: Duration = Duration::from_secs(5);
const TELEPORT_DEADLINE: Duration = Duration::from_secs(5);

/// Outcome of one reset step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    TimedOut,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub status: StepStatus,
    pub detail: String,
}

/// Per-step statuses plus the overall verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ResetReport {
    pub success: bool,
    pub partial_success: bool,
    pub confirmed: bool,
    pub steps: Vec<StepReport>,
    pub elapsed_secs: f64,
}

/// Sequences the destructive reset steps with bounded-time degradation.
#[derive(Debug, Clone)]
pub struct ResetOrchestrator {
    area_min: VoxelPoint,
    area_max: VoxelPoint,
    spawn: VoxelPoint,
}

impl ResetOrchestrator {
    pub fn new(area_min: VoxelPoint, area_max: VoxelPoint, spawn: VoxelPoint) -> Self {
        Self {
            area_min,
            area_max,
            spawn,
        }
    }

    /// Runs the reset. Destructive, so it requires `confirm = true`; without
    /// it a warning report is returned and no commands are issued.
    pub async fn run(&self, client: &mut RconClient, confirm: bool) -> ResetReport {
        let started = Instant::now();

        if !confirm {
            tracing::warn!("reset requested without confirmation; no commands issued");
            return ResetReport {
                success: false,
                partial_success: false,
                confirmed: false,
                steps: vec![StepReport {
                    step: "confirmation",
                    status: StepStatus::Skipped,
                    detail: "pass --confirm to perform a destructive reset".to_string(),
                }],
                elapsed_secs: started.elapsed().as_secs_f64(),
            };
        }

        let mut steps = Vec::new();

        let clear = format!("fill {} {} air", self.area_min, self.area_max);
        steps.push(run_step(client, "clear_build_area", &[&clear], CLEAR_DEADLINE).await);

        steps.push(
            run_step(
                client,
                "lock_time_of_day",
                &["gamerule doDaylightCycle false", "time set day"],
                TIME_DEADLINE,
            )
            .await,
        );

        let teleport = format!("tp @a {}", self.spawn);
        steps.push(run_step(client, "teleport_to_safety", &[&teleport], TELEPORT_DEADLINE).await);

        let succeeded = steps.iter().filter(|s| s.status == StepStatus::Ok).count();
        let report = ResetReport {
            success: succeeded == steps.len(),
            partial_success: succeeded > 0 && succeeded < steps.len(),
            confirmed: true,
            steps,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        tracing::info!(
            "reset finished: {}/{} steps succeeded in {:.1}s",
            succeeded,
            report.steps.len(),
            report.elapsed_secs
        );
        report
    }
}

/// Runs one step's commands under a single shared deadline. The step's
/// status is the worst outcome among its commands.
async fn run_step(
    client: &mut RconClient,
    name: &'static str,
    commands: &[&str],
    budget: Duration,
) -> StepReport {
    let deadline = Instant::now() + budget;
    let mut status = StepStatus::Ok;
    let mut detail = String::new();

    for command in commands {
        let result = client.execute_with_deadline(command, deadline).await;
        let outcome = classify(&result);
        if outcome != StepStatus::Ok {
            status = outcome;
            detail = failure_detail(&result);
            break;
        }
        detail = result.raw_response;
    }

    match status {
        StepStatus::Ok => tracing::info!("reset step {} completed", name),
        StepStatus::TimedOut => {
            tracing::warn!("reset step {} timed out, proceeding with remaining steps", name)
        }
        StepStatus::Failed => tracing::warn!("reset step {} failed: {}", name, detail),
        StepStatus::Skipped => {}
    }

    StepReport {
        step: name,
        status,
        detail,
    }
}

fn classify(result: &CommandResult) -> StepStatus {
    if result.success {
        StepStatus::Ok
    } else if result.error == Some(ErrorKind::Timeout) {
        StepStatus::TimedOut
    } else {
        StepStatus::Failed
    }
}

fn failure_detail(result: &CommandResult) -> String {
    match result.error {
        Some(kind) if result.raw_response.is_empty() => kind.to_string(),
        Some(kind) => format!("{kind}: {}", result.raw_response),
        None => result.raw_response.clone(),
    }
}
