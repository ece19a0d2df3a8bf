//! Command line interface

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use gcodelink::{
    event_bus, extract_path, list_ports, load_program, remember_recent_file, AppEvent,
    ChannelSession, CommandStreamer, Config, PathBounds, StreamEvent, TransferStatus,
};
use gcodelink_core::{ConnectionEvent, DisconnectReason, FileEvent};

/// Stream G-code programs to a printer or CNC controller
#[derive(Parser, Debug)]
#[command(name = "gcodelink", version, about)]
pub struct Cli {
    /// Path to a JSON or TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available serial ports
    Ports,
    /// Print the commands a program file would send
    Parse {
        /// Program file
        file: PathBuf,
    },
    /// Print the toolpath of a program file
    Path {
        /// Program file
        file: PathBuf,
        /// Print points as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stream a program file to the device
    Send(SendArgs),
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Program file
    pub file: PathBuf,
    /// Serial port (overrides the config file)
    #[arg(short, long)]
    pub port: Option<String>,
    /// Baud rate (overrides the config file)
    #[arg(short, long)]
    pub baud: Option<u32>,
    /// Read timeout per response in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Abort when a command gets no response
    #[arg(long)]
    pub halt_on_missing_ack: bool,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_or_default(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Command::Ports => ports(),
        Command::Parse { file } => parse(&file, &config),
        Command::Path { file, json } => path(&file, json, &config),
        Command::Send(args) => send(args, config, cli.config).await,
    }
}

fn ports() -> anyhow::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        let marker = if port.likely_device { "*" } else { " " };
        println!("{} {:<24} {}", marker, port.port_name, port.description);
    }
    Ok(())
}

fn parse(file: &Path, config: &Config) -> anyhow::Result<()> {
    let program = load_program(file, &config.files.allowed_extensions)?;
    for command in &program.commands {
        println!("{}", command);
    }
    Ok(())
}

fn path(file: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let program = load_program(file, &config.files.allowed_extensions)?;
    let points = extract_path(&program.commands)
        .with_context(|| format!("extracting path from {}", file.display()))?;
    gcodelink_core::emit!(AppEvent::File(FileEvent::PathExtracted {
        points: points.len(),
    }));

    if let Some(bounds) = PathBounds::of(&points) {
        let (dx, dy, dz) = bounds.size();
        tracing::info!(
            "{} points, extent {:.3} x {:.3} x {:.3}",
            points.len(),
            dx,
            dy,
            dz
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        for point in &points {
            println!(
                "{:>6}  X:{:.3} Y:{:.3} Z:{:.3}",
                point.command_index, point.x, point.y, point.z
            );
        }
    }
    Ok(())
}

async fn send(
    args: SendArgs,
    mut config: Config,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Overrides apply to this run only; the saved file keeps its values
    let mut effective = config.clone();
    if let Some(baud) = args.baud {
        effective.connection.baud_rate = baud;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        effective.connection.timeout_ms = timeout_ms;
    }
    if args.halt_on_missing_ack {
        effective.streaming.halt_on_missing_ack = true;
    }

    let program = load_program(&args.file, &effective.files.allowed_extensions)?;
    let params = effective
        .connection
        .connection_params(args.port.as_deref())?;

    let session = Arc::new(ChannelSession::new());
    session
        .open(params)
        .with_context(|| {
            format!(
                "opening {}",
                args.port.as_deref().unwrap_or("configured port")
            )
        })?;

    let streamer = CommandStreamer::with_options(effective.stream_options())
        .with_sink(Arc::new(event_bus()));
    let handle = streamer.spawn(session.clone(), program.commands.clone());
    let mut progress = handle.progress();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            changed = progress.changed() => {
                if changed.is_err() || progress.borrow().finished {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::warn!("Interrupted, closing session");
                let session = session.clone();
                tokio::task::spawn_blocking(move || session.close()).await?;
                break;
            }
        }
    }

    let result = handle.wait().await?;
    session.close();

    if let Err(e) = remember_recent_file(&mut config, config_path.as_deref(), &args.file) {
        tracing::warn!("Could not update recent files: {}", e);
    }

    match result.status {
        TransferStatus::Completed => {
            println!(
                "Sent {} commands in {:.1}s ({} without response)",
                result.sent(),
                result.duration.as_secs_f64(),
                result.missing_acks()
            );
            Ok(())
        }
        TransferStatus::Aborted { index, ref error } => {
            let command = program
                .commands
                .get(index)
                .map(|c| c.to_string())
                .unwrap_or_default();
            bail!(
                "stream aborted at command {} ({}) after {} sent: {}",
                index,
                command,
                result.sent(),
                error
            )
        }
        TransferStatus::NotConnected => bail!("not connected"),
    }
}

/// Forward bus events into the log
pub fn log_events() {
    event_bus().subscribe(Default::default(), |event: AppEvent| match &event {
        AppEvent::Connection(ConnectionEvent::Disconnected {
            reason: DisconnectReason::ConnectionLost,
            ..
        })
        | AppEvent::Stream(StreamEvent::Aborted { .. }) => tracing::warn!("{}", event.description()),
        AppEvent::File(FileEvent::Loaded { .. }) => tracing::debug!("{}", event.description()),
        _ => tracing::trace!("{}", event.description()),
    });
}
