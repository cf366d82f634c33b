use crate::exec;
use crate::orchestrator::{Probe, Step, StepContext};
use crate::types::StepError;

const INSTALL_SCRIPT: &str = "curl -fsSL https://get.docker.com | sh";

/// Container runtime, installed through the vendor convenience script.
/// Deliberately not toggleable: later bundles may rely on it.
pub struct Docker;

impl Step for Docker {
    fn id(&self) -> &'static str {
        "docker"
    }

    fn title(&self) -> &'static str {
        "Docker engine"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        Probe::satisfied_when(ctx.runner.exists("docker"))
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::vendor_script(INSTALL_SCRIPT))?;
        // usermod -aG is a no-op when the membership already exists
        if let Ok(user) = std::env::var("USER") {
            ctx.runner
                .status(&exec::sudo(&["usermod", "-aG", "docker", user.as_str()]))?;
        }
        Ok(())
    }

    fn follow_up(&self) -> Option<&'static str> {
        Some("Log out and back in so the docker group membership takes effect")
    }
}
