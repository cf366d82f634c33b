use crate::exec;
use crate::orchestrator::{Probe, Step, StepContext};
use crate::types::StepError;

/// Refresh the apt index and apply pending upgrades. Every later step
/// assumes a current package database, so a failure here aborts the run.
pub struct SystemUpdate;

impl Step for SystemUpdate {
    fn id(&self) -> &'static str {
        "system-update"
    }

    fn title(&self) -> &'static str {
        "System update"
    }

    fn fatal(&self) -> bool {
        true
    }

    fn check(&self, _ctx: &mut StepContext<'_>) -> Probe {
        // The index goes stale the moment it is fetched; always refresh.
        Probe::Missing
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::apt_update())?;
        ctx.runner.status(&exec::apt_upgrade())?;
        Ok(())
    }
}

const BASE_PACKAGES: &[&str] = &[
    "build-essential",
    "curl",
    "wget",
    "git",
    "unzip",
    "zip",
    "ca-certificates",
    "gnupg",
    "lsb-release",
    "apt-transport-https",
    "software-properties-common",
    "jq",
    "htop",
    "tmux",
    "vim",
];

/// Compiler toolchain and the transport tools (curl, git, unzip) the
/// vendor-script steps below depend on.
pub struct BasePackages;

impl Step for BasePackages {
    fn id(&self) -> &'static str {
        "base-packages"
    }

    fn title(&self) -> &'static str {
        "Base packages"
    }

    fn fatal(&self) -> bool {
        true
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        Probe::satisfied_when(
            BASE_PACKAGES
                .iter()
                .all(|pkg| ctx.runner.succeeds(&exec::dpkg_installed(pkg))),
        )
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::apt_install(BASE_PACKAGES))?;
        Ok(())
    }
}

/// snapd is an auxiliary packaging backend and unavailable on some
/// architectures and containers, so this step is non-fatal; snap-based
/// steps degrade on their own when the backend stays missing.
pub struct Snapd;

impl Step for Snapd {
    fn id(&self) -> &'static str {
        "snapd"
    }

    fn title(&self) -> &'static str {
        "snap daemon"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        Probe::satisfied_when(ctx.runner.exists("snap"))
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::apt_install(&["snapd"]))?;
        Ok(())
    }
}
