use crate::exec;
use crate::orchestrator::{Probe, Step, StepContext};
use crate::profile::ProfileEdit;
use crate::types::StepError;
use std::path::PathBuf;

const OMZ_INSTALL: &str = "curl -fsSL \
    https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh \
    | sh -s -- --unattended --keep-zshrc";

const PLUGINS: &[(&str, &str)] = &[
    (
        "zsh-autosuggestions",
        "https://github.com/zsh-users/zsh-autosuggestions",
    ),
    (
        "zsh-syntax-highlighting",
        "https://github.com/zsh-users/zsh-syntax-highlighting",
    ),
];

const PLUGINS_LINE: &str = "plugins=(git docker zsh-autosuggestions zsh-syntax-highlighting)";

/// zsh + oh-my-zsh with the two stock suggestion/highlighting plugins.
/// Theme and plugin list are written through the profile mutator as
/// in-place line replacements; the alias block is a marker-guarded append.
pub struct ZshEnvironment;

fn omz_dir(ctx: &StepContext<'_>) -> PathBuf {
    ctx.home().join(".oh-my-zsh")
}

fn plugin_dir(ctx: &StepContext<'_>, name: &str) -> PathBuf {
    omz_dir(ctx).join("custom/plugins").join(name)
}

// The same edits drive both the precondition and the action, so a failed
// profile write keeps the step eligible on the next run.
fn theme_edit(theme: &str) -> ProfileEdit {
    ProfileEdit::ReplaceLine {
        prefix: "ZSH_THEME=",
        line: format!("ZSH_THEME=\"{theme}\""),
    }
}

fn plugins_edit() -> ProfileEdit {
    ProfileEdit::ReplaceLine {
        prefix: "plugins=",
        line: PLUGINS_LINE.to_string(),
    }
}

fn aliases_edit() -> ProfileEdit {
    ProfileEdit::Append {
        marker: "# devup: shell defaults",
        block: "export EDITOR=vim\n\
                alias ll='ls -alF'\n\
                alias gs='git status'\n\
                alias k='kubectl'"
            .to_string(),
    }
}

impl Step for ZshEnvironment {
    fn id(&self) -> &'static str {
        "zsh"
    }

    fn title(&self) -> &'static str {
        "zsh + oh-my-zsh"
    }

    fn check(&self, ctx: &mut StepContext<'_>) -> Probe {
        let edits = [
            theme_edit(ctx.toggles.zsh_theme()),
            plugins_edit(),
            aliases_edit(),
        ];
        let done = ctx.runner.exists("zsh")
            && omz_dir(ctx).is_dir()
            && PLUGINS
                .iter()
                .all(|(name, _)| plugin_dir(ctx, name).is_dir())
            && edits.iter().all(|edit| ctx.profile.satisfies(edit));
        Probe::satisfied_when(done)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
        ctx.runner.status(&exec::apt_install(&["zsh"]))?;

        if !omz_dir(ctx).is_dir() {
            ctx.runner.status(&exec::vendor_script(OMZ_INSTALL))?;
        }

        for (name, repo) in PLUGINS {
            let dest = plugin_dir(ctx, name);
            if !dest.is_dir() {
                ctx.runner.status(&exec::git_clone(repo, &dest))?;
            }
        }

        ctx.edit_profile(theme_edit(ctx.toggles.zsh_theme()))?;
        ctx.edit_profile(plugins_edit())?;
        ctx.edit_profile(aliases_edit())?;

        Ok(())
    }

    fn follow_up(&self) -> Option<&'static str> {
        Some("Run `chsh -s $(which zsh)` and log out to make zsh your login shell")
    }
}
