//! LR compiler entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};

use lrc::LrcError;
use lrc_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    if let Err(err) = lrc_cli::run(&args) {
        report(&err);
        process::exit(1);
    }

    info!("Completed successfully");
}

fn init_logging(level: &str) {
    let parsed = LevelFilter::from_str(level);
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(*parsed.as_ref().unwrap_or(&LevelFilter::Warn))
        .init();
    if parsed.is_err() {
        warn!(log_level = level; "Invalid log level, using 'warn'");
    }
}

/// Render every diagnostic of `err` as its own report.
fn report(err: &LrcError) {
    let reporter = miette::GraphicalReportHandler::new();
    for reportable in to_reportables(err) {
        let mut rendered = String::new();
        match reporter.render_report(&mut rendered, &reportable) {
            Ok(()) => error!("{rendered}"),
            Err(fmt_err) => error!(err:% = reportable, fmt_err:%; "Failed to render error report"),
        }
    }
}
