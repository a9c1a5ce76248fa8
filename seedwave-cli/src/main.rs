mod browse;
mod cli;
mod commands;
mod player;
mod render;

use crate::cli::{Args, Command};
use crate::commands::Context;
use clap::Parser;
use seedwave_catalogue_http::HttpCatalogue;
use seedwave_core::{CoreError, SeedwaveConfig};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "seedwave::main";

fn main() {
    let args = Args::parse();

    // `seed` needs neither config nor network
    if matches!(args.command, Command::Seed) {
        commands::print_seed();
        return;
    }

    let loaded = SeedwaveConfig::load_or_create();
    init_tracing(
        args.verbose,
        loaded.as_ref().ok().and_then(SeedwaveConfig::log_file_path),
    );

    let mut config = match loaded {
        Ok(config) => config,
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                "Config file {} has a syntax error: {parse_error}",
                seedwave_core::config_path().display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    debug!(target: LOG_TARGET, "Using catalogue service at {}", config.service.base_url);

    if args.api_url.is_some() {
        config.apply_api_url_override(args.api_url.clone());
        if let Err(e) = config.validate() {
            error!("{e}");
            std::process::exit(1);
        }
    }

    let api = match HttpCatalogue::from_config(&config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            error!("Failed to create catalogue client: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Shared cancellation token for graceful shutdown
    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let ctx = Context {
        config,
        api,
        cancel,
    };

    runtime.block_on(async {
        match args.command {
            Command::Seed => commands::print_seed(),
            Command::List(list) => commands::list(&ctx, list).await,
            Command::Browse(browse) => commands::browse(&ctx, browse).await,
            Command::Song(song) => commands::song(&ctx, song).await,
            Command::Download(download) => commands::download(&ctx, download).await,
        }
    });

    // Blocking stdin reads would otherwise keep the runtime alive on shutdown
    runtime.shutdown_timeout(std::time::Duration::from_millis(100));
}

/// Log filter used when `RUST_LOG` is unset: seedwave's own targets at a
/// level picked by `-v`, everything else at warn.
fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    format!("warn,seedwave={level}")
}

/// Initialize tracing on stderr, plus `log_file` when file logging is enabled
fn init_tracing(verbose: u8, log_file: Option<PathBuf>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // stdout carries command output
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 0);

    let file_layer = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            ),
            Err(e) => {
                eprintln!("Failed to open log file at {}: {e}", path.display());
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_verbosity_to_seedwave() {
        assert_eq!(default_filter(0), "warn,seedwave=info");
        assert_eq!(default_filter(1), "warn,seedwave=debug");
        assert_eq!(default_filter(4), "warn,seedwave=trace");
        assert!(EnvFilter::try_new(default_filter(2)).is_ok());
    }
}
