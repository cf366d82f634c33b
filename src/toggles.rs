//! Capability toggles: the flat environment-variable configuration
//! surface, read once at startup and immutable afterwards.

use std::collections::HashMap;

/// The only value that forces a toggle on. Any other non-empty value
/// forces it off; unset (or empty) falls back to the step's default.
pub const ENABLE_TOKEN: &str = "1";

const NO_GUI_VAR: &str = "DEVUP_NO_GUI";
const PYTHON_VERSION_VAR: &str = "DEVUP_PYTHON_VERSION";
const ZSH_THEME_VAR: &str = "DEVUP_ZSH_THEME";

pub const DEFAULT_PYTHON_VERSION: &str = "3.12";
pub const DEFAULT_ZSH_THEME: &str = "robbyrussell";

/// Step toggles and their environment variables. Steps not listed here
/// (system update, base packages, docker) cannot be switched off.
const SWITCHES: &[(&str, &str)] = &[
    ("snapd", "DEVUP_INSTALL_SNAPD"),
    ("zsh", "DEVUP_INSTALL_ZSH"),
    ("node", "DEVUP_INSTALL_NODE"),
    ("python", "DEVUP_INSTALL_PYTHON"),
    ("rust", "DEVUP_INSTALL_RUST"),
    ("anaconda", "DEVUP_INSTALL_ANACONDA"),
    ("cloud-clis", "DEVUP_INSTALL_CLOUD_CLIS"),
    ("kubernetes", "DEVUP_INSTALL_KUBERNETES"),
    ("security-tools", "DEVUP_INSTALL_SECURITY"),
    ("virtualization", "DEVUP_INSTALL_VIRTUALIZATION"),
    ("database-guis", "DEVUP_INSTALL_DB_GUIS"),
    ("ides", "DEVUP_INSTALL_IDES"),
    ("firewall", "DEVUP_SETUP_FIREWALL"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Forced(bool),
    Default,
}

#[derive(Debug, Clone)]
pub struct ToggleSet {
    switches: HashMap<&'static str, Toggle>,
    no_gui: bool,
    python_version: String,
    zsh_theme: String,
}

impl ToggleSet {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup; tests inject maps here.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut switches = HashMap::new();
        for (id, var) in SWITCHES {
            switches.insert(*id, parse_toggle(lookup(var)));
        }
        let no_gui = matches!(lookup(NO_GUI_VAR).as_deref(), Some(ENABLE_TOKEN));
        let python_version = lookup(PYTHON_VERSION_VAR)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string());
        let zsh_theme = lookup(ZSH_THEME_VAR)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ZSH_THEME.to_string());
        Self {
            switches,
            no_gui,
            python_version,
            zsh_theme,
        }
    }

    /// Explicit tri-state for a step id. Ids without a documented
    /// variable are never forced.
    pub fn state(&self, id: &str) -> Toggle {
        self.switches.get(id).copied().unwrap_or(Toggle::Default)
    }

    /// Global graphical-application suppression flag.
    pub fn no_gui(&self) -> bool {
        self.no_gui
    }

    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    pub fn zsh_theme(&self) -> &str {
        &self.zsh_theme
    }
}

fn parse_toggle(value: Option<String>) -> Toggle {
    match value.as_deref() {
        None | Some("") => Toggle::Default,
        Some(ENABLE_TOKEN) => Toggle::Forced(true),
        Some(_) => Toggle::Forced(false),
    }
}
