//! `dashcam` - CLI for the dashcam recording daemon.
//!
//! This binary provides the command-line interface for running the recording
//! daemon and inspecting recorded clips.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use nix::sys::signal::Signal;
use tracing::{info, warn};

use dashcam::cli::{Cli, ClipsCommand, Command, ConfigCommand, DaemonCommand};
use dashcam::gps::{GpsdSource, PositionSource};
use dashcam::recorder::{FfmpegRecorder, RecorderParams};
use dashcam::service::{DashcamService, ShutdownHandle};
use dashcam::storage::ClipStore;
use dashcam::{daemon, init_logging, Config, PositionCell};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Daemon(daemon_cmd) => handle_daemon(&config, &daemon_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Clips(clips_cmd) => handle_clips(&config, &clips_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_daemon(config: &Config, cmd: &DaemonCommand) -> anyhow::Result<()> {
    match cmd {
        DaemonCommand::Start => run_daemon(config),
        DaemonCommand::Stop { force } => {
            let signal = if *force {
                Signal::SIGKILL
            } else {
                Signal::SIGTERM
            };
            let pid = daemon::signal_daemon(&config.pid_file_path(), signal)?;
            println!("Sent {signal} to daemon (pid {pid}).");
            Ok(())
        }
    }
}

fn run_daemon(config: &Config) -> anyhow::Result<()> {
    let pid_path = config.pid_file_path();
    daemon::write_pid_file(&pid_path)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let result = runtime.block_on(run_service(config));

    daemon::remove_pid_file(&pid_path);
    result
}

async fn run_service(config: &Config) -> anyhow::Result<()> {
    let position = PositionCell::new();

    // A failed GPS subscription degrades to the placeholder position text;
    // it never prevents recording.
    let mut gps_source = config.gps.enabled.then(|| GpsdSource::new(&config.gps));
    if let Some(source) = gps_source.as_mut() {
        if let Err(e) = source.start(position.clone()).await {
            warn!(
                error = %e,
                "position updates unavailable; filenames will use the placeholder"
            );
        }
    }

    let shutdown = ShutdownHandle::new();
    let trigger = shutdown.clone();
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("failed to register SIGTERM handler")?;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        info!("shutdown requested");
        trigger.shutdown();
    });

    let recorder = FfmpegRecorder::new(RecorderParams::from(&config.recording));
    let service = DashcamService::new(config, recorder, position);
    let result = service.run(shutdown).await;

    if let Some(source) = &gps_source {
        source.stop();
    }
    result.map_err(Into::into)
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let pid = daemon::read_live_pid(&config.pid_file_path())?;
    let store = ClipStore::new(config.output_dir());
    let stats = store.stats()?;

    if json {
        let status = serde_json::json!({
            "daemon_running": pid.is_some(),
            "pid": pid,
            "output_dir": store.dir(),
            "clip_count": stats.clip_count,
            "total_bytes": stats.total_bytes,
            "oldest": stats.oldest,
            "newest": stats.newest,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("dashcam status");
        println!("--------------");
        match pid {
            Some(pid) => println!("Daemon:      running (pid {pid})"),
            None => println!("Daemon:      not running"),
        }
        println!("Output dir:  {}", store.dir().display());
        #[allow(clippy::cast_precision_loss)]
        let mib = stats.total_bytes as f64 / (1024.0 * 1024.0);
        println!("Clips:       {} ({mib:.1} MiB)", stats.clip_count);
        if let Some(newest) = stats.newest {
            println!(
                "Newest clip: {}",
                newest.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    Ok(())
}

fn handle_clips(config: &Config, cmd: &ClipsCommand) -> anyhow::Result<()> {
    let store = ClipStore::new(config.output_dir());
    match cmd {
        ClipsCommand::List { limit } => {
            let mut clips = store.list()?;
            if clips.is_empty() {
                println!("No clips recorded.");
                return Ok(());
            }
            clips.sort_by(|a, b| b.modified.cmp(&a.modified));
            for clip in clips.iter().take(*limit) {
                let modified: DateTime<Local> = clip.modified.into();
                #[allow(clippy::cast_precision_loss)]
                let mib = clip.len as f64 / (1024.0 * 1024.0);
                println!(
                    "{}  {mib:>8.1} MiB  {}",
                    modified.format("%Y-%m-%d %H:%M:%S"),
                    clip.path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default()
                );
            }
        }
        ClipsCommand::Prune => {
            let deleted = store.prune(config.storage.max_files)?;
            let retained = store.list()?.len();
            println!("Deleted {deleted} clip(s); {retained} retained.");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Output dir:     {}", config.output_dir().display());
                println!("  Max files:      {}", config.storage.max_files);
                println!();
                println!("[Recording]");
                println!(
                    "  Clip duration:  {} s",
                    config.recording.clip_duration_secs
                );
                println!(
                    "  Video:          {}x{} @ {} fps, {} b/s",
                    config.recording.width,
                    config.recording.height,
                    config.recording.frame_rate,
                    config.recording.video_bitrate
                );
                println!(
                    "  Devices:        {} / {}",
                    config.recording.video_device, config.recording.audio_device
                );
                println!();
                println!("[GPS]");
                println!("  Enabled:        {}", config.gps.enabled);
                println!("  gpsd:           {}", config.gpsd_addr());
                println!(
                    "  Thresholds:     {} s / {} m",
                    config.gps.min_interval_secs, config.gps.min_displacement_m
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
