use crate::exec::{self, CmdSpec};
use crate::orchestrator::{Probe, Step, StepContext};
use crate::profile::ProfileEdit;
use crate::types::StepError;
use color_eyre::eyre::eyre;

const NODESOURCE_SETUP: &str =
    "curl -fsSL https://deb.nodesource.com/setup_22.x | sudo -E bash -";

/// Node.js from the NodeSource apt repository.
pub struct Node;

impl Step for Node {
    fn id(&self) -> &'static str {
        "node"
    }

    fn title(&self) -> &'static str {
        "Node.js"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        Probe::satisfied_when(ctx.runner.exists("node"))
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::vendor_script(NODESOURCE_SETUP))?;
        ctx.runner.status(&exec::apt_install(&["nodejs"]))?;
        Ok(())
    }
}

const PYENV_INSTALL: &str = "curl -fsSL https://pyenv.run | bash";

const PYENV_BLOCK: &str = "export PYENV_ROOT=\"$HOME/.pyenv\"\n\
    export PATH=\"$PYENV_ROOT/bin:$PATH\"\n\
    eval \"$(pyenv init - --no-rehash)\"";

/// Python through pyenv. The interpreter version comes from
/// `DEVUP_PYTHON_VERSION`; `pyenv install -s` keeps re-runs cheap.
pub struct Python;

impl Step for Python {
    fn id(&self) -> &'static str {
        "python"
    }

    fn title(&self) -> &'static str {
        "Python (pyenv)"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        // `~/.pyenv` alone is not enough: the interpreter build is the
        // last thing `run` does and must survive partial failures, so the
        // precondition is the requested version itself.
        let version = ctx
            .home()
            .join(".pyenv/versions")
            .join(ctx.toggles.python_version());
        Probe::satisfied_when(version.is_dir())
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        // Interpreter builds link against these
        ctx.runner.status(&exec::apt_install(&[
            "libssl-dev",
            "zlib1g-dev",
            "libbz2-dev",
            "libreadline-dev",
            "libsqlite3-dev",
            "libffi-dev",
            "liblzma-dev",
        ]))?;

        let pyenv_root = ctx.home().join(".pyenv");
        if !pyenv_root.is_dir() {
            ctx.runner.status(&exec::vendor_script(PYENV_INSTALL))?;
        }

        ctx.edit_profile(ProfileEdit::Append {
            marker: "# devup: pyenv",
            block: PYENV_BLOCK.to_string(),
        })?;

        // pyenv is not on PATH within this process; call it by location
        let pyenv = pyenv_root.join("bin/pyenv").display().to_string();
        let version = ctx.toggles.python_version().to_string();
        ctx.runner.status(&CmdSpec::new(
            pyenv.as_str(),
            &["install", "-s", version.as_str()],
        ))?;
        Ok(())
    }
}

const RUSTUP_INSTALL: &str =
    "curl -fsSL https://sh.rustup.rs | sh -s -- -y --no-modify-path";

/// Rust through rustup. PATH handling stays with the profile mutator
/// instead of rustup's own profile edits.
pub struct Rust;

impl Step for Rust {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn title(&self) -> &'static str {
        "Rust (rustup)"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let done = ctx.runner.exists("cargo") || ctx.home().join(".cargo/bin/cargo").is_file();
        Probe::satisfied_when(done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::vendor_script(RUSTUP_INSTALL))?;
        ctx.edit_profile(ProfileEdit::Append {
            marker: "# devup: rust",
            block: ". \"$HOME/.cargo/env\"".to_string(),
        })?;
        Ok(())
    }
}

/// Miniconda. Opt-in: it is heavyweight and shadows the pyenv setup for
/// most users.
pub struct Anaconda;

impl Step for Anaconda {
    fn id(&self) -> &'static str {
        "anaconda"
    }

    fn title(&self) -> &'static str {
        "Anaconda (miniconda)"
    }

    fn default_enabled(&self) -> bool {
        false
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        Probe::satisfied_when(ctx.home().join("miniconda3").is_dir())
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        let arch = super::vendor_arch().ok_or_else(|| {
            StepError::recoverable(
                "no Miniconda build for this architecture",
                eyre!("unsupported architecture: {}", target_lexicon::HOST),
            )
        })?;
        let pipeline = format!(
            "curl -fsSL https://repo.anaconda.com/miniconda/Miniconda3-latest-Linux-{arch}.sh \
             -o /tmp/miniconda.sh && sh /tmp/miniconda.sh -b -u -p \"$HOME/miniconda3\""
        );
        ctx.runner.status(&exec::vendor_script(&pipeline))?;
        ctx.edit_profile(ProfileEdit::Append {
            marker: "# devup: conda",
            block: "export PATH=\"$HOME/miniconda3/bin:$PATH\"".to_string(),
        })?;
        Ok(())
    }
}
