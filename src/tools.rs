use std::borrow::Cow;
use yansi::Paint;

/// Macro to print standardized suggestion/follow-up bullet points
///
/// Usage:
/// ```
/// suggest!("Re-running {} retries failed steps", cmd = "devup");
/// suggest!("Simple message without command");
/// ```
#[macro_export]
macro_rules! suggest {
    // Pattern with cmd parameter
    ($fmt:expr, cmd = $cmd:expr $(, $($args:tt)*)?) => {
        println!(
            "• {}",
            format!($fmt, $crate::tools::format_cmd($cmd) $(, $($args)*)?)
        );
    };
    // Pattern without cmd parameter
    ($fmt:expr $(, $($args:tt)*)?) => {
        println!("• {}", format!($fmt $(, $($args)*)?));
    };
}

/// Helper function to format commands with green italic styling
pub fn format_cmd(cmd: &str) -> String {
    Paint::green(cmd).italic().to_string()
}

/// Print a neutral progress line
#[inline]
pub fn info(message: impl Into<Cow<'static, str>>) {
    let msg = message.into();
    println!("{} {}", "→".cyan().bold(), msg);
}

/// Print a success line in green
#[inline]
pub fn success(message: impl Into<Cow<'static, str>>) {
    let msg = message.into();
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message in yellow
#[inline]
pub fn warn(message: impl Into<Cow<'static, str>>) {
    let msg = message.into();
    eprintln!("{}: {}", "Warning".yellow().bold(), msg);
}

/// Print an error message in red
#[inline]
pub fn error(message: impl Into<Cow<'static, str>>) {
    let msg = message.into();
    eprintln!("{}: {}", "Error".red().bold(), msg);
}
