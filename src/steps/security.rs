use crate::exec;
use crate::orchestrator::{Probe, Step, StepContext};
use crate::types::StepError;

const SECURITY_PACKAGES: &[&str] = &["nmap", "net-tools", "fail2ban", "openssl", "ufw"];

/// Network inspection and hardening utilities from apt. Installs the ufw
/// package but leaves enabling it to the opt-in firewall step.
pub struct SecurityTools;

impl Step for SecurityTools {
    fn id(&self) -> &'static str {
        "security-tools"
    }

    fn title(&self) -> &'static str {
        "Security tooling"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        Probe::satisfied_when(
            SECURITY_PACKAGES
                .iter()
                .all(|pkg| ctx.runner.succeeds(&exec::dpkg_installed(pkg))),
        )
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::apt_install(SECURITY_PACKAGES))?;
        Ok(())
    }
}

/// Enable ufw with SSH allowed. Opt-in: switching a firewall on can cut
/// off an active remote session.
pub struct Firewall;

impl Step for Firewall {
    fn id(&self) -> &'static str {
        "firewall"
    }

    fn title(&self) -> &'static str {
        "Firewall (ufw)"
    }

    fn default_enabled(&self) -> bool {
        false
    }

    fn check(&self, _ctx: &mut StepContext<'_>) -> Probe {
        // `ufw enable` and the allow rule are idempotent; re-applying is
        // cheaper than parsing status output.
        Probe::Missing
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::sudo(&["ufw", "allow", "OpenSSH"]))?;
        ctx.runner
            .status(&exec::sudo(&["ufw", "--force", "enable"]))?;
        Ok(())
    }
}
