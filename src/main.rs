//! arcstats-monitor: periodic ZFS ARC statistics sampler.
//!
//! Polls the ARC kstat counters on a fixed interval, keeps a bounded
//! hit-ratio history and serves a read-only plain-text view over HTTP.

use anyhow::Context;
use arcstats_monitor::config::{load_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT};
use arcstats_monitor::source::source_from_settings;
use arcstats_monitor::Collector;
use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

mod cli;
mod commands;
mod handlers;
mod state;

use cli::{Args, Commands, ConfigFormat, LogLevel};
use handlers::{doc_handler, health_handler, history_handler, stats_handler, summary_handler};
use state::AppState;

/// Loads the config file (unless disabled) and applies CLI overrides on top.
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref()).map_err(|e| anyhow::anyhow!("{e}"))?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(interval) = args.interval {
        config.poll_interval_seconds = Some(interval);
    }
    if let Some(capacity) = args.history_capacity {
        config.history_capacity = Some(capacity);
    }
    if let Some(threshold) = args.warning_threshold {
        config.hit_ratio_warning_threshold = Some(threshold);
    }
    if let Some(timeout) = args.acquisition_timeout {
        config.acquisition_timeout_seconds = Some(timeout);
    }
    if let Some(source) = &args.source {
        config.source = Some(source.as_str().to_string());
    }
    if let Some(path) = &args.source_path {
        config.source_path = Some(path.clone());
    }
    if args.raw_units {
        config.unit_mode = Some("raw".into());
    }
    if args.disable_http {
        config.enable_http = Some(false);
    }

    Ok(config)
}

/// Shows configuration in requested format
fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    let output = commands::config::render_config(config, format, false)?;
    println!("{output}");
    Ok(())
}

/// CLI level wins over the config file; unknown config values fall back to info.
fn setup_logging(config: &Config, args: &Args) {
    let level = match &args.log_level {
        Some(LogLevel::Off) => LevelFilter::OFF,
        Some(LogLevel::Error) => LevelFilter::ERROR,
        Some(LogLevel::Warn) => LevelFilter::WARN,
        Some(LogLevel::Info) => LevelFilter::INFO,
        Some(LogLevel::Debug) => LevelFilter::DEBUG,
        Some(LogLevel::Trace) => LevelFilter::TRACE,
        None => config
            .log_level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LevelFilter::INFO),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    info!("Logging initialized with level: {}", level);
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/summary", get(summary_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .route("/doc", get(doc_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = config.engine_settings() {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    let config = resolve_config(&args)?;

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Check => {
                if !commands::command_check(&config)? {
                    std::process::exit(1);
                }
                Ok(())
            }
            Commands::Config {
                output,
                format,
                commented,
            } => commands::command_config(output.clone(), format.clone(), *commented),
            Commands::Test { iterations, filter } => {
                setup_logging(&config, &args);
                if commands::command_test(&config, *iterations, filter).await? > 0 {
                    std::process::exit(1);
                }
                Ok(())
            }
            Commands::GenerateSample {
                output,
                hit_ratio,
                accesses,
            } => commands::command_generate_sample(output.clone(), *hit_ratio, *accesses),
        };
    }

    // Validate config before starting the collector
    let settings = match config.engine_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
    };

    setup_logging(&config, &args);
    info!("Starting arcstats-monitor");

    let source = source_from_settings(&settings)?;
    let collector = Collector::new(source, settings)?;
    info!(
        "Polling {} every {}s, keeping {} history points",
        collector.source_description(),
        collector.settings().poll_interval.as_secs(),
        collector.history_capacity()
    );

    // The first tick of the loop performs the initial poll.
    collector.start()?;

    if !config.enable_http.unwrap_or(true) {
        info!("HTTP view disabled, collecting until shutdown");
        shutdown_signal().await;
        collector.shutdown().await;
        info!("arcstats-monitor stopped gracefully");
        return Ok(());
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port)
        .parse()
        .with_context(|| format!("invalid bind address {bind_ip_str}:{port}"))?;
    if !addr.ip().is_loopback() {
        warn!("HTTP view bound to non-loopback address {}", addr.ip());
    }

    let state = Arc::new(AppState {
        collector: collector.clone(),
        config: Arc::new(config.clone()),
    });

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("arcstats-monitor listening on http://{}", addr);

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    collector.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("arcstats-monitor stopped gracefully");
    Ok(())
}
