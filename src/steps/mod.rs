//! Statically declared provisioning steps.
//!
//! The order of [`all`] is the total execution order; it is fixed here
//! and never reordered at runtime. Step bodies are thin wrappers over
//! the exec and profile layers.

mod cloud;
mod desktop;
mod docker;
mod security;
mod shellenv;
mod system;
mod toolchains;

use crate::orchestrator::Step;

/// The full provisioning sequence.
pub fn all() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(system::SystemUpdate),
        Box::new(system::BasePackages),
        Box::new(system::Snapd),
        Box::new(docker::Docker),
        Box::new(shellenv::ZshEnvironment),
        Box::new(toolchains::Node),
        Box::new(toolchains::Python),
        Box::new(toolchains::Rust),
        Box::new(toolchains::Anaconda),
        Box::new(cloud::CloudClis),
        Box::new(cloud::Kubernetes),
        Box::new(security::SecurityTools),
        Box::new(desktop::Virtualization),
        Box::new(desktop::DatabaseGuis),
        Box::new(desktop::Ides),
        Box::new(security::Firewall),
    ]
}

/// Architecture label used by vendor download URLs (uname style).
pub(crate) fn vendor_arch() -> Option<&'static str> {
    match target_lexicon::HOST.architecture {
        target_lexicon::Architecture::X86_64 => Some("x86_64"),
        target_lexicon::Architecture::Aarch64(_) => Some("aarch64"),
        _ => None,
    }
}

/// Architecture label in Debian/Go style (amd64/arm64).
pub(crate) fn deb_arch() -> Option<&'static str> {
    match target_lexicon::HOST.architecture {
        target_lexicon::Architecture::X86_64 => Some("amd64"),
        target_lexicon::Architecture::Aarch64(_) => Some("arm64"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::ScriptedRunner;
    use crate::orchestrator::{Orchestrator, Outcome, Probe, StepContext};
    use crate::probe::{Backends, HostFacts, OsFamily};
    use crate::profile::ProfileMutator;
    use crate::toggles::ToggleSet;
    use std::path::Path;

    fn ubuntu_facts() -> HostFacts {
        HostFacts {
            os_family: OsFamily::Ubuntu,
            wsl: false,
            backends: Backends {
                apt: true,
                snap: true,
            },
        }
    }

    fn toggles(vars: &[(&str, &str)]) -> ToggleSet {
        ToggleSet::from_lookup(|var| {
            vars.iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| value.to_string())
        })
    }

    #[test]
    fn step_ids_are_unique() {
        let steps = all();
        let mut ids: Vec<_> = steps.iter().map(|step| step.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), steps.len());
    }

    #[test]
    fn firewall_and_anaconda_are_opt_in() {
        for step in all() {
            let expected = !matches!(step.id(), "firewall" | "anaconda");
            assert_eq!(step.default_enabled(), expected, "step {}", step.id());
        }
    }

    #[test]
    fn graphical_steps_are_exactly_the_desktop_bundles() {
        for step in all() {
            let expected = matches!(step.id(), "virtualization" | "database-guis" | "ides");
            assert_eq!(step.graphical(), expected, "step {}", step.id());
        }
    }

    #[test]
    fn disabled_node_step_issues_no_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        // Everything resolvable and every query succeeding: all steps with
        // real preconditions skip, except those that always run.
        let mut runner = ScriptedRunner {
            on_path: vec![
                "apt-get", "snap", "docker", "zsh", "node", "cargo", "aws", "gcloud",
                "kubectl", "helm", "minikube", "git",
            ],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(
            ubuntu_facts(),
            toggles(&[("DEVUP_INSTALL_NODE", "0")]),
            all(),
        );
        let report = orchestrator.run(dir.path(), &mut profile, &mut runner);

        assert_eq!(report.outcome_of("node"), Some(Outcome::SkippedByToggle));
        assert!(
            !runner
                .invoked
                .iter()
                .any(|line| line.contains("nodesource") || line.contains("nodejs")),
            "node install commands must not run: {:?}",
            runner.invoked
        );
    }

    #[test]
    fn docker_is_skipped_when_already_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        let mut runner = ScriptedRunner {
            on_path: vec![
                "apt-get", "snap", "docker", "zsh", "node", "cargo", "aws", "gcloud",
                "kubectl", "helm", "minikube", "git",
            ],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(ubuntu_facts(), toggles(&[]), all());
        let report = orchestrator.run(dir.path(), &mut profile, &mut runner);

        assert_eq!(
            report.outcome_of("docker"),
            Some(Outcome::SkippedByPrecondition)
        );
        assert!(
            !runner.invoked.iter().any(|line| line.contains("get.docker.com")),
            "docker installer must not run when docker is present"
        );
    }

    #[test]
    fn wsl_suppresses_graphical_bundles_despite_enabled_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        let mut runner = ScriptedRunner {
            on_path: vec![
                "apt-get", "snap", "docker", "zsh", "node", "cargo", "aws", "gcloud",
                "kubectl", "helm", "minikube", "git",
            ],
            ..Default::default()
        };
        let facts = HostFacts {
            wsl: true,
            ..ubuntu_facts()
        };
        let orchestrator = Orchestrator::new(
            facts,
            toggles(&[
                ("DEVUP_INSTALL_VIRTUALIZATION", "1"),
                ("DEVUP_INSTALL_DB_GUIS", "1"),
                ("DEVUP_INSTALL_IDES", "1"),
            ]),
            all(),
        );
        let report = orchestrator.run(dir.path(), &mut profile, &mut runner);

        for id in ["virtualization", "database-guis", "ides"] {
            assert_eq!(
                report.outcome_of(id),
                Some(Outcome::SkippedByToggle),
                "step {id}"
            );
        }
        assert!(
            !runner
                .invoked
                .iter()
                .any(|line| line.contains("virtualbox") || line.contains("dbeaver")),
        );
    }

    fn check_step(
        step: &dyn Step,
        home: &Path,
        profile: &mut ProfileMutator,
        runner: &mut ScriptedRunner,
        vars: &[(&str, &str)],
    ) -> Probe {
        let facts = ubuntu_facts();
        let step_toggles = toggles(vars);
        let mut ctx = StepContext {
            facts: &facts,
            toggles: &step_toggles,
            home,
            profile,
            runner,
        };
        step.check(&mut ctx)
    }

    #[test]
    fn python_retries_until_requested_interpreter_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        let mut runner = ScriptedRunner::default();
        let step = toolchains::Python;

        // pyenv itself installed but the interpreter build failed: the
        // step must stay eligible on the next run.
        std::fs::create_dir_all(dir.path().join(".pyenv/bin")).unwrap();
        assert_eq!(
            check_step(&step, dir.path(), &mut profile, &mut runner, &[]),
            Probe::Missing
        );

        std::fs::create_dir_all(dir.path().join(".pyenv/versions/3.12")).unwrap();
        assert_eq!(
            check_step(&step, dir.path(), &mut profile, &mut runner, &[]),
            Probe::Satisfied
        );

        // A different requested version reopens the step
        assert_eq!(
            check_step(
                &step,
                dir.path(),
                &mut profile,
                &mut runner,
                &[("DEVUP_PYTHON_VERSION", "3.11")],
            ),
            Probe::Missing
        );
    }

    #[test]
    fn zsh_retries_until_profile_edits_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        let mut runner = ScriptedRunner {
            on_path: vec!["zsh", "git"],
            ..Default::default()
        };
        let step = shellenv::ZshEnvironment;

        for plugin in ["zsh-autosuggestions", "zsh-syntax-highlighting"] {
            std::fs::create_dir_all(
                dir.path().join(".oh-my-zsh/custom/plugins").join(plugin),
            )
            .unwrap();
        }

        // Binaries and clones in place but no profile lines yet
        assert_eq!(
            check_step(&step, dir.path(), &mut profile, &mut runner, &[]),
            Probe::Missing
        );

        let facts = ubuntu_facts();
        let step_toggles = toggles(&[]);
        let mut ctx = StepContext {
            facts: &facts,
            toggles: &step_toggles,
            home: dir.path(),
            profile: &mut profile,
            runner: &mut runner,
        };
        step.run(&mut ctx).unwrap();

        assert_eq!(
            check_step(&step, dir.path(), &mut profile, &mut runner, &[]),
            Probe::Satisfied
        );
    }

    #[test]
    fn snap_installed_earlier_in_the_run_is_seen_by_later_steps() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        // snap absent at probe time but resolvable once steps ask
        let mut runner = ScriptedRunner {
            on_path: vec![
                "apt-get", "snap", "docker", "zsh", "node", "cargo", "aws", "kubectl",
                "helm", "minikube", "git",
            ],
            ..Default::default()
        };
        let facts = HostFacts {
            backends: Backends {
                apt: true,
                snap: false,
            },
            ..ubuntu_facts()
        };
        let orchestrator = Orchestrator::new(facts, toggles(&[]), all());
        let report = orchestrator.run(dir.path(), &mut profile, &mut runner);

        assert_eq!(report.outcome_of("cloud-clis"), Some(Outcome::Success));
        assert!(
            runner
                .invoked
                .iter()
                .any(|line| line.contains("snap install google-cloud-cli")),
            "gcloud must install through the freshly available backend: {:?}",
            runner.invoked
        );
    }

    #[test]
    fn system_update_refreshes_on_every_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = ProfileMutator::new(dir.path().join(".zshrc"));
        let mut runner = ScriptedRunner {
            on_path: vec![
                "apt-get", "snap", "docker", "zsh", "node", "cargo", "aws", "gcloud",
                "kubectl", "helm", "minikube", "git",
            ],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(ubuntu_facts(), toggles(&[]), all());
        let report = orchestrator.run(dir.path(), &mut profile, &mut runner);

        // Deliberately never satisfied: the package index is refreshed on
        // every invocation.
        assert_eq!(report.outcome_of("system-update"), Some(Outcome::Success));
        assert!(
            runner
                .invoked
                .iter()
                .any(|line| line.contains("apt-get update"))
        );
    }

    #[test]
    fn host_arch_labels_cover_this_target() {
        // Both label styles must agree on availability.
        assert_eq!(vendor_arch().is_some(), deb_arch().is_some());
    }
}
