//! The provisioning run: an ordered list of steps executed once, each
//! gated by its toggle and a fast precondition check.
//!
//! There is no per-step retry or timeout; re-running the whole binary is
//! the retry mechanism, backed by the precondition/idempotence contract
//! of every step.

use crate::exec::Runner;
use crate::probe::HostFacts;
use crate::profile::{ProfileEdit, ProfileMutator};
use crate::toggles::{Toggle, ToggleSet};
use crate::tools;
use crate::types::StepError;
use std::path::Path;

const TARGET: &str = "devup::orchestrator";

/// Result of a precondition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Satisfied,
    Missing,
}

impl Probe {
    pub fn satisfied_when(done: bool) -> Self {
        if done { Probe::Satisfied } else { Probe::Missing }
    }
}

/// Terminal state of one step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    SkippedByToggle,
    SkippedByPrecondition,
    FailedRecoverable,
    FailedFatal,
}

/// Everything a step may touch while checking or running.
pub struct StepContext<'a> {
    pub facts: &'a HostFacts,
    pub toggles: &'a ToggleSet,
    /// Invoking user's home directory, resolved once at startup; tests
    /// point this at a scratch directory.
    pub home: &'a Path,
    pub profile: &'a mut ProfileMutator,
    pub runner: &'a mut dyn Runner,
}

impl StepContext<'_> {
    pub fn home(&self) -> &Path {
        self.home
    }

    /// Profile edit with the escalation rule: inability to perform the
    /// very first write of a run is fatal (later steps assume a writable
    /// profile), later failures are recoverable.
    pub fn edit_profile(&mut self, edit: ProfileEdit) -> Result<(), StepError> {
        let first = !self.profile.has_mutated();
        let target = self.profile.target().display().to_string();
        self.profile.apply(&edit).map(|_| ()).map_err(|err| {
            let context = format!("failed to update {target}");
            if first {
                StepError::fatal(context, err)
            } else {
                StepError::recoverable(context, err)
            }
        })
    }
}

/// One atomic, independently toggleable provisioning action.
pub trait Step {
    fn id(&self) -> &'static str;
    fn title(&self) -> &'static str;

    /// Enablement when the toggle is unset.
    fn default_enabled(&self) -> bool {
        true
    }

    /// Graphical steps are suppressed under WSL and `DEVUP_NO_GUI`,
    /// regardless of their individual toggle.
    fn graphical(&self) -> bool {
        false
    }

    /// A failing fatal step aborts the rest of the run.
    fn fatal(&self) -> bool {
        false
    }

    /// Fast, side-effect-free: is the goal state already achieved?
    fn check(&self, ctx: &mut StepContext<'_>) -> Probe;

    /// Perform the install. Must be safe to re-invoke after a partial
    /// failure.
    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError>;

    /// Manual action the user must take after this step succeeds.
    fn follow_up(&self) -> Option<&'static str> {
        None
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(&'static str, Outcome)>,
    pub aborted_at: Option<&'static str>,
    pub follow_ups: Vec<&'static str>,
}

impl RunReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn outcome_of(&self, id: &str) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(step, _)| *step == id)
            .map(|(_, outcome)| *outcome)
    }
}

/// Owns the fixed step sequence plus the immutable host facts and toggles
/// every step sees.
pub struct Orchestrator {
    facts: HostFacts,
    toggles: ToggleSet,
    steps: Vec<Box<dyn Step>>,
}

impl Orchestrator {
    pub fn new(facts: HostFacts, toggles: ToggleSet, steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            facts,
            toggles,
            steps,
        }
    }

    pub fn facts(&self) -> &HostFacts {
        &self.facts
    }

    /// Effective enablement: graphical suppression dominates the explicit
    /// toggle, which in turn dominates the step default.
    pub fn effective_enabled(&self, step: &dyn Step) -> bool {
        if step.graphical() && (self.facts.wsl || self.toggles.no_gui()) {
            return false;
        }
        match self.toggles.state(step.id()) {
            Toggle::Forced(enabled) => enabled,
            Toggle::Default => step.default_enabled(),
        }
    }

    pub fn step_enabled(&self, id: &str) -> bool {
        self.steps
            .iter()
            .any(|step| step.id() == id && self.effective_enabled(step.as_ref()))
    }

    /// Execute all steps in declared order. Never returns early except
    /// through the fatal-abort rule; per-step failures are captured as
    /// outcomes rather than propagated.
    pub fn run(
        &self,
        home: &Path,
        profile: &mut ProfileMutator,
        runner: &mut dyn Runner,
    ) -> RunReport {
        let mut report = RunReport::default();

        for step in &self.steps {
            if !self.effective_enabled(step.as_ref()) {
                tracing::debug!(target: TARGET, step = step.id(), "disabled");
                tools::info(format!("{}: skipped (disabled)", step.title()));
                report.outcomes.push((step.id(), Outcome::SkippedByToggle));
                continue;
            }

            let mut ctx = StepContext {
                facts: &self.facts,
                toggles: &self.toggles,
                home,
                profile: &mut *profile,
                runner: &mut *runner,
            };

            if step.check(&mut ctx) == Probe::Satisfied {
                tools::info(format!("{}: already set up", step.title()));
                report
                    .outcomes
                    .push((step.id(), Outcome::SkippedByPrecondition));
                continue;
            }

            tracing::info!(target: TARGET, step = step.id(), "running");
            tools::info(format!("{}: installing…", step.title()));
            match step.run(&mut ctx) {
                Ok(()) => {
                    tools::success(step.title());
                    if let Some(note) = step.follow_up() {
                        report.follow_ups.push(note);
                    }
                    report.outcomes.push((step.id(), Outcome::Success));
                }
                Err(err) if step.fatal() || err.is_fatal() => {
                    tools::error(format!("{}: {err}", step.title()));
                    tracing::error!(target: TARGET, step = step.id(), error = ?err, "fatal step failure");
                    report.outcomes.push((step.id(), Outcome::FailedFatal));
                    report.aborted_at = Some(step.id());
                    break;
                }
                Err(err) => {
                    tools::warn(format!("{}: {err} (continuing)", step.title()));
                    tracing::warn!(target: TARGET, step = step.id(), error = ?err, "recoverable step failure");
                    report
                        .outcomes
                        .push((step.id(), Outcome::FailedRecoverable));
                }
            }
        }

        report
    }
}
