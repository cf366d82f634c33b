use crate::exec::SystemRunner;
use crate::orchestrator::{Orchestrator, Outcome, RunReport};
use crate::probe;
use crate::profile::ProfileMutator;
use crate::steps;
use crate::toggles::ToggleSet;
use crate::types::DevupError;
use crate::{suggest, tools};
use clap::Parser;

const TARGET: &str = "devup::cli";

/// devup - Ubuntu developer machine provisioner
#[derive(Parser, Debug)]
#[command(name = "devup")]
#[command(
    author,
    version,
    about = "devup - provision a fresh Ubuntu machine for development",
    long_about = "Runs the full provisioning sequence once: system update, base packages, \
    Docker, shell environment, language toolchains, cloud CLIs, Kubernetes tooling and \
    desktop bundles. There are no flags or subcommands; every step is toggled through \
    DEVUP_* environment variables (see the README for the full list and defaults). \
    Re-running is safe: steps whose goal state already holds are skipped."
)]
pub struct DevupCli {}

pub fn devup_main() -> Result<(), DevupError> {
    let _cli = DevupCli::parse();

    // SAFETY: geteuid has no failure modes or side effects
    ensure_unprivileged(unsafe { libc::geteuid() })?;

    let mut runner = SystemRunner;
    let facts = probe::probe(&runner)?;
    if !facts.backends.apt {
        return Err(DevupError::unsupported_host(
            "apt-get not found on PATH; devup only provisions apt-based systems",
        ));
    }
    tracing::debug!(
        target: TARGET,
        os_family = ?facts.os_family,
        backends = ?facts.backends,
        "host accepted"
    );
    let toggles = ToggleSet::from_env();
    let orchestrator = Orchestrator::new(facts, toggles, steps::all());

    let home = dirs::home_dir()
        .ok_or_else(|| DevupError::unsupported_host("cannot locate home directory"))?;
    let target = if orchestrator.step_enabled("zsh") {
        home.join(".zshrc")
    } else {
        home.join(".bashrc")
    };
    let mut profile = ProfileMutator::new(target);

    tracing::info!(
        target: TARGET,
        profile = %profile.target().display(),
        wsl = orchestrator.facts().wsl,
        "starting provisioning run"
    );

    let report = orchestrator.run(&home, &mut profile, &mut runner);
    print_summary(&report);

    match report.aborted_at {
        Some(step) => Err(DevupError::Aborted { step }),
        None => Ok(()),
    }
}

/// Vendor install scripts and profile edits assume a regular user;
/// package installs elevate per call through sudo instead.
fn ensure_unprivileged(euid: libc::uid_t) -> Result<(), DevupError> {
    if euid == 0 {
        return Err(DevupError::Privilege);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    let installed = report.count(Outcome::Success);
    let satisfied = report.count(Outcome::SkippedByPrecondition);
    let disabled = report.count(Outcome::SkippedByToggle);
    let failed = report.count(Outcome::FailedRecoverable) + report.count(Outcome::FailedFatal);

    println!();
    println!(
        "{installed} installed, {satisfied} already satisfied, {disabled} disabled, {failed} failed"
    );

    if !report.follow_ups.is_empty() {
        println!();
        println!("Manual follow-ups:");
        for note in &report.follow_ups {
            suggest!("{}", note);
        }
    }

    println!();
    if let Some(step) = report.aborted_at {
        tools::error(format!(
            "run aborted at `{step}`; fix the failure and re-run devup"
        ));
    } else if report.count(Outcome::FailedRecoverable) > 0 {
        tools::warn("some optional steps failed");
        suggest!("Re-running {} retries only what is missing", cmd = "devup");
    } else {
        tools::success("provisioning complete");
    }
}
