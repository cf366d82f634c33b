type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level failure classes. Each variant maps to a distinct process exit
/// code so scripts wrapping devup can tell refusals apart from aborts.
#[derive(thiserror::Error, Debug)]
pub enum DevupError {
    /// Host is not an Ubuntu-family system (or could not be identified).
    #[error("unsupported host: {detail}")]
    UnsupportedHost { detail: String },

    /// Invoked as root. devup elevates individual commands with sudo and
    /// must own the invoking user's shell profile.
    #[error("refusing to run as root; run as a regular user (sudo is used per command)")]
    Privilege,

    /// A fatal step failed and the remainder of the run was not executed.
    #[error("provisioning aborted at step `{step}`")]
    Aborted { step: &'static str },
}

impl DevupError {
    pub fn unsupported_host(detail: impl Into<String>) -> Self {
        Self::UnsupportedHost {
            detail: detail.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Privilege => 2,
            Self::UnsupportedHost { .. } => 3,
            Self::Aborted { .. } => 4,
        }
    }
}

/// Failure of a single step, classified for the run policy: recoverable
/// failures are logged and the run continues, fatal ones abort it.
#[derive(thiserror::Error, Debug)]
pub enum StepError {
    #[error("{context}")]
    Recoverable {
        context: String,
        #[source]
        source: Source,
    },

    #[error("{context}")]
    Fatal {
        context: String,
        #[source]
        source: Source,
    },
}

impl StepError {
    pub fn recoverable(context: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Recoverable {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn fatal(context: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Fatal {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}
