use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stratavox_build::{BatchOptions, BlockType, CommandBatcher, CommandScript, Placement};
use stratavox_builder::config::BuilderConfig;
use stratavox_builder::input;
use stratavox_builder::reset::ResetOrchestrator;
use stratavox_geo::{CoordinateTransformer, SurfaceInterpolator, TrajectoryCalculator, VoxelPoint};
use stratavox_rcon::RconClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stratavox",
    about = "Renders subsurface survey data as block placements in a remote voxel world"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a wellbore trajectory from a survey-station file
    Trajectory {
        /// JSON array of {tvd, azimuth, inclination} records
        #[arg(long)]
        input: PathBuf,
        /// Wellhead position as easting,northing,elevation
        #[arg(long)]
        start: String,
        /// Block type to build with
        #[arg(long, default_value = "stone")]
        block: String,
        /// Print the command script instead of executing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Build a horizon surface from a corner or scattered-point file
    Surface {
        /// JSON array of 4 corners, or scattered records with --scattered
        #[arg(long)]
        input: PathBuf,
        /// Input is {point_id, line_number, easting, northing, elevation} records
        #[arg(long)]
        scattered: bool,
        /// Block type to build with
        #[arg(long, default_value = "sandstone")]
        block: String,
        /// Print the command script instead of executing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Execute a single raw command against the remote console
    Exec { command: String },
    /// Clear the build area, lock time-of-day, and teleport occupants to safety
    Reset {
        /// Actually perform the destructive reset
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = BuilderConfig::from_env()?;

    match Cli::parse().command {
        Command::Trajectory {
            input: path,
            start,
            block,
            dry_run,
        } => {
            let stations = input::load_stations(&path)?;
            config.ensure_point_budget(stations.len())?;
            let start = input::parse_world_point(&start)?;
            let block: BlockType = block.parse()?;

            let transformer = CoordinateTransformer::new(config.transform)?;
            let calculator = TrajectoryCalculator::new(&transformer, config.sample_step)?;
            let trajectory = calculator.compute(&stations, start)?;

            let stats = trajectory.stats();
            tracing::info!(
                "trajectory: {} voxels, max depth {:.1}, horizontal displacement {:.1}, path length {:.1}",
                trajectory.voxels().len(),
                stats.max_depth,
                stats.horizontal_displacement,
                stats.path_length
            );

            let script = batch(trajectory.voxels(), &block);
            deliver(&config, script, dry_run).await
        }

        Command::Surface {
            input: path,
            scattered,
            block,
            dry_run,
        } => {
            let block: BlockType = block.parse()?;
            let transformer = CoordinateTransformer::new(config.transform)?;
            let interpolator = SurfaceInterpolator::new(&transformer);

            let surface = if scattered {
                let points = input::load_horizon_points(&path)?;
                config.ensure_point_budget(points.len())?;
                interpolator.interpolate_lines(&points)?
            } else {
                let corners = input::load_corners(&path)?;
                interpolator.interpolate_quad(&corners)?
            };

            tracing::info!(
                "surface: {} voxels from {} interpolated points ({} clamped)",
                surface.voxels().len(),
                surface.world_points().len(),
                surface.clamped()
            );

            let script = batch(surface.voxels(), &block);
            deliver(&config, script, dry_run).await
        }

        Command::Exec { command } => {
            let mut client = connect(&config).await?;
            let result = client.execute(&command).await;
            client.close().await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Command::Reset { confirm } => {
            // An unconfirmed reset never connects, so it cannot touch the world.
            let mut client = if confirm {
                connect(&config).await?
            } else {
                RconClient::new(config.rcon.clone())
            };
            let orchestrator =
                ResetOrchestrator::new(config.area_min, config.area_max, config.spawn);
            let report = orchestrator.run(&mut client, confirm).await;
            client.close().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn batch(voxels: &[VoxelPoint], block: &BlockType) -> CommandScript {
    let placements: Vec<Placement> = voxels
        .iter()
        .map(|v| Placement::new(*v, block.clone()))
        .collect();
    CommandBatcher::new(BatchOptions::default()).batch(&placements)
}

async fn connect(config: &BuilderConfig) -> Result<RconClient> {
    let mut client = RconClient::new(config.rcon.clone());
    client.connect().await.context(
        "failed to establish a remote console session \
         (check STRATAVOX_HOST, STRATAVOX_PORT, and STRATAVOX_SECRET)",
    )?;
    Ok(client)
}

/// Prints the script on a dry run; otherwise executes it and prints the
/// execution report as JSON.
async fn deliver(config: &BuilderConfig, script: CommandScript, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("{}", script.to_text());
        return Ok(());
    }

    let mut client = connect(config).await?;
    let report = client.execute_batch(&script).await;
    client.close().await;

    if !report.success {
        tracing::warn!(
            "{} of {} commands failed; see the failures list in the report",
            report.failures.len(),
            report.commands_executed
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
