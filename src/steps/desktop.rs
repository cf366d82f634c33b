use crate::exec;
use crate::orchestrator::{Probe, Step, StepContext};
use crate::types::StepError;
use color_eyre::eyre::eyre;

/// VirtualBox and Vagrant from apt. Graphical: suppressed under WSL and
/// `DEVUP_NO_GUI`.
pub struct Virtualization;

impl Step for Virtualization {
    fn id(&self) -> &'static str {
        "virtualization"
    }

    fn title(&self) -> &'static str {
        "Virtualization (VirtualBox + Vagrant)"
    }

    fn graphical(&self) -> bool {
        true
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let done = ctx.runner.succeeds(&exec::dpkg_installed("virtualbox"))
            && ctx.runner.succeeds(&exec::dpkg_installed("vagrant"));
        Probe::satisfied_when(done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner
            .status(&exec::apt_install(&["virtualbox", "vagrant"]))?;
        Ok(())
    }
}

// Queries the runner rather than the startup snapshot so a snapd install
// earlier in the same run counts.
fn require_snap(ctx: &StepContext<'_>) -> Result<(), StepError> {
    if ctx.runner.exists("snap") {
        Ok(())
    } else {
        Err(StepError::recoverable(
            "snap backend unavailable",
            eyre!("snapd is not installed; graphical bundles come from snap"),
        ))
    }
}

/// Database workbenches from snap.
pub struct DatabaseGuis;

impl Step for DatabaseGuis {
    fn id(&self) -> &'static str {
        "database-guis"
    }

    fn title(&self) -> &'static str {
        "Database GUIs"
    }

    fn graphical(&self) -> bool {
        true
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let done = ctx.runner.succeeds(&exec::snap_installed("dbeaver-ce"))
            && ctx
                .runner
                .succeeds(&exec::snap_installed("beekeeper-studio"));
        Probe::satisfied_when(done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        require_snap(ctx)?;
        ctx.runner.status(&exec::snap_install("dbeaver-ce", false))?;
        ctx.runner
            .status(&exec::snap_install("beekeeper-studio", false))?;
        Ok(())
    }
}

/// Editor and IDE bundle from snap.
pub struct Ides;

impl Step for Ides {
    fn id(&self) -> &'static str {
        "ides"
    }

    fn title(&self) -> &'static str {
        "IDE bundle"
    }

    fn graphical(&self) -> bool {
        true
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let done = ctx.runner.succeeds(&exec::snap_installed("code"))
            && ctx
                .runner
                .succeeds(&exec::snap_installed("intellij-idea-community"));
        Probe::satisfied_when(done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        require_snap(ctx)?;
        ctx.runner.status(&exec::snap_install("code", true))?;
        ctx.runner
            .status(&exec::snap_install("intellij-idea-community", true))?;
        Ok(())
    }
}
