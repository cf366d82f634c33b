use crate::exec;
use crate::orchestrator::{Probe, Step, StepContext};
use crate::tools;
use crate::types::StepError;
use color_eyre::eyre::eyre;

/// AWS CLI v2 (vendor zip installer) and the Google Cloud CLI (snap).
pub struct CloudClis;

impl Step for CloudClis {
    fn id(&self) -> &'static str {
        "cloud-clis"
    }

    fn title(&self) -> &'static str {
        "Cloud CLIs"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let aws_done = ctx.runner.exists("aws");
        // gcloud comes from snap; without the backend there is nothing to do
        let gcloud_done = ctx.runner.exists("gcloud") || !ctx.runner.exists("snap");
        Probe::satisfied_when(aws_done && gcloud_done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        if !ctx.runner.exists("aws") {
            let arch = super::vendor_arch().ok_or_else(|| {
                StepError::recoverable(
                    "no AWS CLI build for this architecture",
                    eyre!("unsupported architecture: {}", target_lexicon::HOST),
                )
            })?;
            let pipeline = format!(
                "curl -fsSL https://awscli.amazonaws.com/awscli-exe-linux-{arch}.zip \
                 -o /tmp/awscliv2.zip && unzip -oq /tmp/awscliv2.zip -d /tmp \
                 && sudo /tmp/aws/install --update"
            );
            ctx.runner.status(&exec::vendor_script(&pipeline))?;
        }

        // Live query, not the startup snapshot: the snapd step may have
        // installed the backend earlier in this very run.
        if ctx.runner.exists("snap") {
            if !ctx.runner.exists("gcloud") {
                ctx.runner
                    .status(&exec::snap_install("google-cloud-cli", true))?;
            }
        } else {
            tools::warn("snap backend unavailable; skipping the Google Cloud CLI");
        }
        Ok(())
    }
}

/// kubectl, helm and minikube.
pub struct Kubernetes;

impl Step for Kubernetes {
    fn id(&self) -> &'static str {
        "kubernetes"
    }

    fn title(&self) -> &'static str {
        "Kubernetes tooling"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let done = ctx.runner.exists("kubectl")
            && ctx.runner.exists("helm")
            && ctx.runner.exists("minikube");
        Probe::satisfied_when(done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        if !ctx.runner.exists("kubectl") {
            if ctx.runner.exists("snap") {
                ctx.runner.status(&exec::snap_install("kubectl", true))?;
            } else {
                tools::warn("snap backend unavailable; skipping kubectl");
            }
        }

        if !ctx.runner.exists("helm") {
            ctx.runner.status(&exec::vendor_script(
                "curl -fsSL https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3 | bash",
            ))?;
        }

        if !ctx.runner.exists("minikube") {
            let arch = super::deb_arch().ok_or_else(|| {
                StepError::recoverable(
                    "no minikube build for this architecture",
                    eyre!("unsupported architecture: {}", target_lexicon::HOST),
                )
            })?;
            let pipeline = format!(
                "curl -fsSL https://storage.googleapis.com/minikube/releases/latest/minikube-linux-{arch} \
                 -o /tmp/minikube && sudo install /tmp/minikube /usr/local/bin/minikube"
            );
            ctx.runner.status(&exec::vendor_script(&pipeline))?;
        }
        Ok(())
    }
}
