use color_eyre::{
    Result,
    config::{HookBuilder, Theme},
};
use tracing_subscriber::prelude::*;

fn main() -> Result<()> {
    // Initialize color support
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);

    // Set up error reporting with color-aware themes
    if yansi::is_enabled() {
        HookBuilder::default()
            .display_env_section(cfg!(debug_assertions))
            .display_location_section(cfg!(debug_assertions))
            .install()?;
    } else {
        HookBuilder::default()
            .theme(Theme::new())
            .display_env_section(cfg!(debug_assertions))
            .display_location_section(cfg!(debug_assertions))
            .install()?;
    }

    init_tracing();

    if let Err(err) = cli::devup_main() {
        tools::error(format!("{err}"));
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(err.exit_code());
    }
    Ok(())
}

/// Initialize tracing with dual-mode logging
///
/// - If DEVUP_LOG is not set: simple "info: message" format for user-friendly output
/// - If DEVUP_LOG is set: full structured tracing with timestamps and module paths
fn init_tracing() {
    let devup_log = std::env::var("DEVUP_LOG").is_ok();

    if devup_log {
        // Full structured logging mode
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true) // Show module paths
                    .with_filter(
                        tracing_subscriber::EnvFilter::try_from_env("DEVUP_LOG")
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("devup=warn")),
                    ),
            )
            .init();
    } else {
        // Simple user-friendly logging mode
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false) // Hide module paths
                    .with_level(true) // Show level
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false)
                    .without_time() // No timestamps
                    .with_filter(tracing_subscriber::EnvFilter::new("devup=info")),
            )
            .init();
    }
}

mod cli;
mod exec;
mod orchestrator;
mod probe;
mod profile;
mod steps;
mod toggles;
mod tools;
mod types;

pub use types::*;
