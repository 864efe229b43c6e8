//! infiniscroll - infinite scrolling list in the terminal
//!
//! A terminal host for the infiniscroll detection component:
//! - A simulated paged feed with latency and failures
//! - Sentinel visibility and scroll-position detection, switchable at runtime
//! - Loading, end-of-list and retryable error indicators

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use infiniscroll_core::{attributes, ConfigUpdate, Coordinator, Lifecycle};

mod app;
mod config;
mod feed;
mod platform;
mod ui;

use config::HostConfig;
use platform::TerminalPlatform;

/// infiniscroll - Infinite scroll demo
#[derive(Parser)]
#[command(name = "infiniscroll")]
#[command(about = "Infinite scrolling list with end-of-content detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Distance from the end, in rows, that counts as "near the end"
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Scroll throttle interval in milliseconds
    #[arg(long)]
    throttle_ms: Option<u64>,

    /// Disable sentinel visibility detection
    #[arg(long)]
    no_observer: bool,

    /// Disable scroll-position detection
    #[arg(long)]
    no_scroll: bool,

    /// Set a component attribute, e.g. `--attr use-scroll=false`
    ///
    /// Applied after the config file and other flags, with markup parsing
    /// rules. A bare name is treated as a removed attribute.
    #[arg(long = "attr", value_name = "NAME=VALUE")]
    attrs: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the list (default)
    Run,

    /// Print the effective configuration as component attributes
    Config,
}

impl Cli {
    fn overrides(&self) -> ConfigUpdate {
        let mut update = ConfigUpdate::new();
        if let Some(threshold) = self.threshold {
            update = update.threshold(threshold);
        }
        if let Some(ms) = self.throttle_ms {
            update = update.throttle_interval(Duration::from_millis(ms));
        }
        if self.no_observer {
            update = update.use_intersection(false);
        }
        if self.no_scroll {
            update = update.use_scroll(false);
        }
        update
    }
}

/// Split `name=value`; a bare name has no value
fn parse_attr(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value)),
        None => (raw.trim(), None),
    }
}

/// Restore terminal state - called on panic or unexpected exit
fn restore_terminal() {
    use crossterm::{
        event::DisableMouseCapture,
        execute,
        terminal::{disable_raw_mode, LeaveAlternateScreen},
    };
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

fn init_logging() {
    let log_dir = config::logs_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let writer: Box<dyn std::io::Write + Send> =
        match std::fs::File::create(log_dir.join("infiniscroll.log")) {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(std::io::sink()),
        };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(writer))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to restore terminal state
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Log to file; stdout belongs to the TUI
    init_logging();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let host_config = HostConfig::load_or_default(&config_path)?;
    tracing::info!(path = %config_path.display(), "Configuration loaded");

    let mut coordinator = Coordinator::new(TerminalPlatform::new(), host_config.detection.clone());
    coordinator.configure(cli.overrides());
    for raw in &cli.attrs {
        let (name, value) = parse_attr(raw);
        coordinator
            .attribute_changed(name, value)
            .with_context(|| format!("Invalid --attr {raw}"))?;
    }

    match cli.command {
        Some(Commands::Config) => {
            println!("Config file: {}", config_path.display());
            for (name, value) in attributes::attributes(&coordinator) {
                println!("  {name} = {value}");
            }
            println!(
                "  feed: {} items, {} per page, {}ms latency, {:.0}% failures",
                host_config.feed.total_items,
                host_config.feed.page_size,
                host_config.feed.latency_ms,
                host_config.feed.failure_rate * 100.0,
            );
        }
        Some(Commands::Run) | None => {
            tracing::info!(
                threshold = coordinator.threshold(),
                use_observer = coordinator.config().use_intersection,
                use_scroll = coordinator.config().use_scroll,
                "Starting"
            );
            let mut app = app::App::new(coordinator, &host_config);
            app.run().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attr() {
        assert_eq!(parse_attr("threshold=5"), ("threshold", Some("5")));
        assert_eq!(parse_attr("use-scroll=false"), ("use-scroll", Some("false")));
        assert_eq!(parse_attr("has-more"), ("has-more", None));
        assert_eq!(parse_attr("loading="), ("loading", Some("")));
    }

    #[test]
    fn test_flags_become_config_update() {
        let cli = Cli::parse_from(["infiniscroll", "-t", "4", "--no-scroll", "--throttle-ms", "50"]);
        let mut coordinator = Coordinator::new(TerminalPlatform::new(), Default::default());
        coordinator.configure(cli.overrides());

        assert_eq!(coordinator.threshold(), 4);
        assert!(!coordinator.config().use_scroll);
        assert!(coordinator.config().use_intersection);
        assert_eq!(
            coordinator.config().throttle_interval,
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_attrs_go_through_lifecycle() {
        let cli = Cli::parse_from(["infiniscroll", "--attr", "threshold=7px", "--attr", "use-observer=false"]);
        let mut coordinator = Coordinator::new(TerminalPlatform::new(), Default::default());
        for raw in &cli.attrs {
            let (name, value) = parse_attr(raw);
            coordinator.attribute_changed(name, value).unwrap();
        }
        assert_eq!(coordinator.threshold(), 7);
        assert!(!coordinator.config().use_intersection);

        assert!(coordinator.attribute_changed("colour", Some("red")).is_err());
    }
}
