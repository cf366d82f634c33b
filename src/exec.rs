//! External command invocation.
//!
//! Every package-manager transaction, vendor script and git clone goes
//! through the [`Runner`] trait so that steps can be exercised in tests
//! without touching the system. Elevation is requested per call with
//! `sudo`; no long-lived escalated session is held.

use crate::types::StepError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const TARGET: &str = "devup::exec";

#[derive(thiserror::Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code}")]
    Failed { command: String, code: i32 },
}

impl From<ExecError> for StepError {
    fn from(err: ExecError) -> Self {
        StepError::recoverable("external command failed", err)
    }
}

/// A fully described external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Suppress stdout/stderr; used for exit-status queries.
    pub quiet: bool,
}

impl CmdSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            quiet: false,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Single-line rendering for logs and test assertions.
    pub fn rendered(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl std::fmt::Display for CmdSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rendered())
    }
}

/// Command-execution seam between steps and the host.
pub trait Runner {
    /// Run to completion, failing on a non-zero exit status.
    fn status(&mut self, spec: &CmdSpec) -> Result<(), ExecError>;

    /// Read-only: is `program` resolvable on PATH?
    fn exists(&self, program: &str) -> bool;

    /// Exit-status query, for preconditions phrased as "does this command
    /// report the state as present".
    fn succeeds(&mut self, spec: &CmdSpec) -> bool {
        self.status(spec).is_ok()
    }
}

/// The real thing: blocking `std::process::Command` invocations.
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn status(&mut self, spec: &CmdSpec) -> Result<(), ExecError> {
        tracing::debug!(target: TARGET, command = %spec, "running");
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if spec.quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = cmd.status().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                command: spec.rendered(),
                code: status.code().unwrap_or(-1),
            })
        }
    }

    fn exists(&self, program: &str) -> bool {
        resolve_on_path(program).is_some()
    }
}

/// Search PATH for an executable, the way a shell would.
pub fn resolve_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Run a command with per-call elevation.
pub fn sudo(args: &[&str]) -> CmdSpec {
    CmdSpec::new("sudo", args)
}

pub fn apt_update() -> CmdSpec {
    sudo(&["apt-get", "update"])
}

pub fn apt_upgrade() -> CmdSpec {
    sudo(&[
        "DEBIAN_FRONTEND=noninteractive",
        "apt-get",
        "upgrade",
        "-y",
    ])
}

pub fn apt_install(packages: &[&str]) -> CmdSpec {
    let mut args = vec!["DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y"];
    args.extend_from_slice(packages);
    sudo(&args)
}

/// Structured installed-check against the dpkg database, instead of
/// grepping tool output.
pub fn dpkg_installed(package: &str) -> CmdSpec {
    CmdSpec::new("dpkg", &["-s", package]).quiet()
}

pub fn snap_install(name: &str, classic: bool) -> CmdSpec {
    if classic {
        sudo(&["snap", "install", name, "--classic"])
    } else {
        sudo(&["snap", "install", name])
    }
}

pub fn snap_installed(name: &str) -> CmdSpec {
    CmdSpec::new("snap", &["list", name]).quiet()
}

pub fn git_clone(url: &str, dest: &Path) -> CmdSpec {
    let dest = dest.display().to_string();
    CmdSpec::new("git", &["clone", "--depth", "1", url, dest.as_str()])
}

/// Download-and-run a vendor install script. The pipeline runs under `sh`
/// and is expected to be idempotent on the vendor's side.
pub fn vendor_script(pipeline: &str) -> CmdSpec {
    CmdSpec::new("sh", &["-c", pipeline])
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Runner double: records every invocation, answers `exists` from a
    /// fixed list and fails any command whose rendered line contains one
    /// of the `fail_on` needles.
    #[derive(Default)]
    pub struct ScriptedRunner {
        pub invoked: Vec<String>,
        pub fail_on: Vec<&'static str>,
        pub on_path: Vec<&'static str>,
    }

    impl Runner for ScriptedRunner {
        fn status(&mut self, spec: &CmdSpec) -> Result<(), ExecError> {
            let line = spec.rendered();
            self.invoked.push(line.clone());
            if self.fail_on.iter().any(|needle| line.contains(needle)) {
                return Err(ExecError::Failed {
                    command: line,
                    code: 1,
                });
            }
            Ok(())
        }

        fn exists(&self, program: &str) -> bool {
            self.on_path.contains(&program)
        }
    }
}
