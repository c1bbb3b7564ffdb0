//! Headless tour runner.
//!
//! Plays the guided tour without a UI: simulated user messages arrive at a
//! fixed interval, the phase controller reacts, and every viewport command is
//! logged (and optionally written out as a JSON journal).

use clap::Parser;
use director::{
    default_config_toml, ConfigError, Conversation, HeadlessViewport, PhaseController,
    SystemMessage, TourConfig, ViewportSlot,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tour_model::{CatalogError, TourCatalog, TourPhase};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the runner
#[derive(Parser, Debug)]
#[command(name = "tour_runner")]
#[command(about = "Plays the guided destination tour against a headless viewport")]
struct Args {
    /// Tour configuration (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tour catalog (JSON); the built-in Miami tour when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Number of simulated user messages
    #[arg(long, default_value_t = 3)]
    messages: u32,

    /// Seconds between simulated user messages
    #[arg(long, default_value_t = 45.0)]
    message_interval_secs: f64,

    /// Run on a paused clock so the tour finishes instantly
    #[arg(long)]
    fast: bool,

    /// Run with no viewport attached
    #[arg(long)]
    detached: bool,

    /// Write the viewport command journal to this file
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Debug, Error)]
enum RunnerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("journal error: {0}")]
    Journal(#[from] std::io::Error),
    #[error("journal encoding error: {0}")]
    JournalEncoding(#[from] serde_json::Error),
    #[error("invalid message interval: {0}")]
    Interval(f64),
}

/// Posts director status lines to the log.
struct LoggedConversation;

impl Conversation for LoggedConversation {
    fn append_system_message(&self, message: SystemMessage) {
        info!(topic = %message.topic, "{}", message.text);
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq)]
struct TourSummary {
    phase: TourPhase,
    flights: usize,
    entities: usize,
    elapsed_secs: f64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.print_default_config {
        print!("{}", default_config_toml());
        return Ok(());
    }
    if args.fast {
        tokio::time::pause();
    }

    let summary = run(&args).await?;
    info!(
        phase = %summary.phase,
        flights = summary.flights,
        entities = summary.entities,
        elapsed_secs = summary.elapsed_secs,
        "tour finished"
    );
    Ok(())
}

async fn run(args: &Args) -> Result<TourSummary, RunnerError> {
    let config = match &args.config {
        Some(path) => TourConfig::from_file(path)?,
        None => TourConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => TourCatalog::from_file(path)?,
        None => TourCatalog::miami(),
    };
    let interval = Duration::try_from_secs_f64(args.message_interval_secs)
        .map_err(|_| RunnerError::Interval(args.message_interval_secs))?;

    let viewport = Arc::new(HeadlessViewport::new());
    let slot = if args.detached {
        ViewportSlot::detached()
    } else {
        ViewportSlot::attached(viewport.clone())
    };
    info!(
        waypoints = catalog.waypoints.len(),
        hotels = catalog.points_of_interest.len(),
        routes = catalog.routes.len(),
        attached = slot.is_attached(),
        "starting tour"
    );

    let start = tokio::time::Instant::now();
    let mut controller = PhaseController::new(config, catalog, slot, Arc::new(LoggedConversation));
    for count in 1..=args.messages {
        if count > 1 {
            tokio::time::sleep(interval).await;
        }
        info!(count, "user message");
        controller.on_trigger_count_changed(count);
        if controller.phase().is_final() {
            break;
        }
    }
    if let Some(run) = controller.live_run() {
        let outcome = run.finished().await;
        info!(%outcome, "last camera run ended");
    }

    if let Some(path) = &args.journal {
        std::fs::write(path, viewport.journal_json()?)?;
        info!(path = %path.display(), "journal written");
    }

    Ok(TourSummary {
        phase: controller.phase(),
        flights: viewport.flights().len(),
        entities: viewport.entity_count(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["tour_runner"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_args() {
        let args = args(&[]);
        assert_eq!(args.messages, 3);
        assert_eq!(args.message_interval_secs, 45.0);
        assert!(!args.fast);
        assert!(!args.detached);
        assert!(args.config.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_reaches_flights() {
        let summary = run(&args(&[])).await.unwrap();

        assert_eq!(summary.phase, TourPhase::Flights);
        // Three location stops, overview + three hotels, routes overview
        assert_eq!(summary.flights, 8);
        assert_eq!(summary.entities, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_run_issues_nothing() {
        let summary = run(&args(&["--detached"])).await.unwrap();

        assert_eq!(summary.phase, TourPhase::Flights);
        assert_eq!(summary.flights, 0);
        assert_eq!(summary.entities, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_message_runs_location_only() {
        let summary = run(&args(&["--messages", "1"])).await.unwrap();

        assert_eq!(summary.phase, TourPhase::Location);
        assert_eq!(summary.flights, 3);
        assert_eq!(summary.entities, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_stop_at_final_phase() {
        let summary = run(&args(&["--messages", "6", "--detached"])).await.unwrap();

        assert_eq!(summary.phase, TourPhase::Flights);
        // Third message at 90s; the remaining three are never sent
        assert!(summary.elapsed_secs < 91.0, "elapsed {}", summary.elapsed_secs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_journal_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let path_arg = path.to_string_lossy().to_string();

        run(&args(&["--messages", "2", "--journal", &path_arg]))
            .await
            .unwrap();

        let journal: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let commands = journal.as_array().unwrap();
        assert!(commands.iter().any(|c| c["command"] == "fly_to"));
        assert!(commands.iter().any(|c| c["command"] == "clear_entities"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_config_reports_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[location]\nflight_duration_secs = -1.0\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();

        let err = run(&args(&["--config", &path_arg])).await.unwrap_err();
        assert!(matches!(err, RunnerError::Config(ConfigError::Invalid { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_interval_rejected() {
        let err = run(&args(&["--message-interval-secs=-2"])).await.unwrap_err();
        assert!(matches!(err, RunnerError::Interval(_)));
    }
}
