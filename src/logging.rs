//! tracing setup and log filter precedence

use std::env;

use clap::Args;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// target prefix of everything this crate logs, script output included
pub const LOG_TARGET: &str = "bwm";

#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Log everything from bwm at trace level
    #[arg(long, global = true, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Log everything from bwm at debug level
    #[arg(long, global = true, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Log level for bwm (error|warn|info|debug|trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Explicit tracing filter directive, overrides the other flags
    /// e.g. "bwm=debug,bwm::script=trace"
    #[arg(long, global = true)]
    pub log_filter: Option<String>,
}

/// filter directive setting `level` for this crate only
pub fn level_spec_for(level: &str) -> String {
    format!("{}={}", LOG_TARGET, level.to_ascii_lowercase())
}

/// final filter spec, first match wins:
/// `--log-filter`, `--trace`/`--debug`/`--log-level`, `RUST_LOG`,
/// the config's `log_level`, then crate-scoped `info`
pub fn compute_spec(args: &LogArgs, config_level: Option<&str>) -> String {
    if let Some(spec) = &args.log_filter {
        return spec.clone();
    }
    if args.trace {
        return level_spec_for("trace");
    }
    if args.debug {
        return level_spec_for("debug");
    }
    if let Some(level) = &args.log_level {
        return level_spec_for(level);
    }
    if let Ok(spec) = env::var("RUST_LOG") {
        if !spec.is_empty() {
            return spec;
        }
    }
    level_spec_for(config_level.unwrap_or("info"))
}

/// install the stderr subscriber; later calls are no-ops
pub fn init(spec: &str) {
    registry()
        .with(EnvFilter::new(spec))
        .with(
            fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}
