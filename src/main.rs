//! # CastDeck — Live Broadcast Scheduler
//!
//! Loads a set of scheduled streams, runs the scheduler loop for a while
//! against the system clock, then prints notifications and a dashboard summary.
//!
//! Usage:
//!   castdeck                              # Built-in demo streams, run 10s
//!   castdeck --seed ~/streams.json        # Load streams from a JSON file
//!   castdeck --start demo-coding          # Go live with a stream immediately
//!   castdeck --run-secs 60 --verbose      # Longer run with debug logs

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveTime, Utc, Weekday};
use clap::Parser;
use tokio::sync::{Mutex, watch};
use tracing_subscriber::EnvFilter;

use castdeck_core::{
    CastDeckConfig, Clock, ConnectedAccount, ConnectedAccounts, Destination, MemoryStore,
    Platform, Schedule, StreamRecord, StreamStatus, SystemClock, VideoSource,
};
use castdeck_scheduler::{NotificationCenter, StatusChange, StreamManager, spawn_scheduler};

#[derive(Parser)]
#[command(
    name = "castdeck",
    version,
    about = "📡 CastDeck — schedule and simulate multi-destination live broadcasts"
)]
struct Cli {
    /// Config file (defaults to ~/.castdeck/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON file with an array of streams (built-in demo streams when omitted)
    #[arg(long)]
    seed: Option<String>,

    /// How long to run the scheduler loop
    #[arg(long, default_value = "10")]
    run_secs: u64,

    /// Stream ids to take live right away
    #[arg(long = "start")]
    start: Vec<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn load_config(path: Option<&str>) -> Result<CastDeckConfig> {
    let config = match path {
        Some(p) => CastDeckConfig::load_from(Path::new(&expand_path(p)))?,
        None => CastDeckConfig::load()?,
    };
    Ok(config)
}

fn load_seed(path: &str) -> Result<Vec<StreamRecord>> {
    let path = expand_path(path);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read seed file {path}"))?;
    let streams: Vec<StreamRecord> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse seed file {path}"))?;
    for stream in &streams {
        stream
            .validate()
            .with_context(|| format!("Invalid stream '{}' in seed file {path}", stream.id))?;
    }
    Ok(streams)
}

/// Demo accounts and streams: a weekly gaming show, tomorrow's coding
/// session and a tutorial that starts in a few minutes.
fn demo_seed(accounts: &ConnectedAccounts) -> Result<Vec<StreamRecord>> {
    let youtube = ConnectedAccount::new("acc-youtube-gaming", Platform::YouTube, "Gaming Channel");
    let twitch = ConnectedAccount::new("acc-twitch-main", Platform::Twitch, "Main Twitch");
    accounts.connect(youtube.clone())?;
    accounts.connect(twitch.clone())?;

    let now = Utc::now();
    let evening = NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default();
    let afternoon = NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default();
    let tomorrow = (now + Duration::days(1))
        .date_naive()
        .and_time(afternoon)
        .and_utc();

    let gaming = StreamRecord::new(
        "demo-gaming",
        "Weekly Gaming Session",
        VideoSource::upload("gaming_highlights.mp4"),
        Schedule::weekly(evening, vec![Weekday::Fri, Weekday::Sat]).with_auto_stop(120),
    )
    .with_description("Weekend highlights replayed for the community")
    .with_destination(Destination::integrated("dest-gaming-yt", &youtube))
    .with_destination(Destination::integrated("dest-gaming-twitch", &twitch));

    let coding = StreamRecord::new(
        "demo-coding",
        "Live Coding: Building a Web App",
        VideoSource::link("https://drive.google.com/file/d/coding-session"),
        Schedule::once(tomorrow),
    )
    .with_description("Pair programming a small web app from scratch")
    .with_destination(Destination::integrated("dest-coding-yt", &youtube));

    let tutorial = StreamRecord::new(
        "demo-ffmpeg",
        "FFmpeg Tutorial",
        VideoSource::upload("ffmpeg_tutorial.mp4"),
        Schedule::once(now + Duration::minutes(4)),
    )
    .with_destination(Destination::manual("dest-ffmpeg-rtmp", Platform::CustomRtmp, "live_key_123"));

    Ok(vec![gaming, coding, tutorial])
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "castdeck=debug,castdeck_core=debug,castdeck_scheduler=debug"
    } else {
        "castdeck=info,castdeck_core=info,castdeck_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let accounts = Arc::new(ConnectedAccounts::load(Arc::new(MemoryStore::new())));
    let seed = match &cli.seed {
        Some(path) => load_seed(path)?,
        None => demo_seed(&accounts)?,
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut manager = StreamManager::new(
        seed,
        NotificationCenter::new(config.notifications.max_history),
        clock.clone(),
        config.scheduler.clone(),
    )
    .with_accounts(accounts);

    for id in &cli.start {
        match manager.request_status_change(id, StreamStatus::Live) {
            StatusChange::Applied(_) => {}
            StatusChange::Rejected(reason) => {
                tracing::warn!("⚠️ Cannot start '{}': {:?}", id, reason)
            }
            StatusChange::UnknownStream => tracing::warn!("⚠️ No stream with id '{}'", id),
        }
    }

    let manager = Arc::new(Mutex::new(manager));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_scheduler(
        manager.clone(),
        clock,
        config.scheduler.poll_interval(),
        shutdown_rx,
    );

    tracing::info!("▶️ Running for {}s (Ctrl+C to stop early)", cli.run_secs);
    tokio::select! {
        _ = tokio::time::sleep(std::time::Duration::from_secs(cli.run_secs)) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }
    shutdown_tx.send(true).ok();
    handle.await.context("Scheduler task failed")?;

    let manager = manager.lock().await;

    println!("\n📺 Streams");
    for stream in manager.streams() {
        println!("   [{:<9}] {} ({})", stream.status.to_string(), stream.title, stream.id);
        for destination in manager.resolve_destinations(&stream.id).unwrap_or_default() {
            println!("      → {} [{:?}]", destination.label, destination.status);
        }
    }

    println!("\n🔔 Notifications ({} unread)", manager.sink().unread_count());
    for notification in manager.sink().list() {
        println!(
            "   {} [{:?}] {}",
            notification.created_at.format("%H:%M:%S"),
            notification.kind,
            notification.message
        );
    }

    let summary = manager.summary();
    println!("\n📊 Dashboard");
    println!("   Total:     {}", summary.total);
    println!("   Scheduled: {}", summary.scheduled);
    println!("   Live:      {}", summary.live);
    println!("   Ended:     {}", summary.ended);
    println!("   Errored:   {}", summary.errored);
    println!("   Duration:  {} min", summary.total_duration_minutes);

    Ok(())
}
