mod cli;
mod error_fmt;
mod sort;

use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    if matches!(cli.cmd, Commands::Health) {
        if cli.json {
            println!("{}", serde_json::json!({ "status": "ok" }));
        } else {
            println!("ok");
        }
        return Ok(());
    }

    let cfg = sort::load_config(&cli.config)?;
    // Dropping the guard flushes the file sink, so keep it until the command returns.
    let _log_guard = init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            items,
            max_cycles,
            tick_ms,
        } => {
            let (tx, rx) = crossbeam_channel::bounded::<()>(1);
            ctrlc::set_handler(move || {
                let _ = tx.try_send(());
            })
            .wrap_err("install Ctrl-C handler")?;
            sort::run_sort(&cfg, items.as_deref(), max_cycles, tick_ms, cli.json, rx)?;
        }
        Commands::SelfCheck => sort::self_check(&cfg, cli.json)?,
        Commands::Health => {}
    }
    Ok(())
}

/// Console logs go to stderr so stdout carries only results. An optional
/// JSON-lines file sink follows `[logging]`.
fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &sorter_config::Logging,
) -> Result<Option<WorkerGuard>> {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let (console_json, console_text) = if json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            ),
        )
    };

    let mut guard = None;
    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_text)
        .with(file_layer)
        .try_init()
        .wrap_err("initialize logging")?;
    Ok(guard)
}
