//! Environment probing: one immutable snapshot of host facts per run.
//!
//! Probing is read-only and happens exactly once at startup; every step
//! sees the same [`HostFacts`] for the lifetime of the process.

use crate::exec::Runner;
use crate::types::DevupError;
use std::path::Path;

const TARGET: &str = "devup::probe";

const OS_RELEASE: &str = "/etc/os-release";
const KERNEL_OSRELEASE: &str = "/proc/sys/kernel/osrelease";

/// Host OS family. Only the Ubuntu family is supported; anything else is
/// refused before any step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Ubuntu,
}

/// Packaging backends resolvable on PATH at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backends {
    pub apt: bool,
    pub snap: bool,
}

/// Immutable snapshot of the host, computed once at startup.
#[derive(Debug, Clone)]
pub struct HostFacts {
    pub os_family: OsFamily,
    /// Linux userland hosted on a Windows kernel (WSL). Graphical and
    /// snap-dependent steps are suppressed there.
    pub wsl: bool,
    pub backends: Backends,
}

pub fn probe(runner: &dyn Runner) -> Result<HostFacts, DevupError> {
    probe_at(
        Path::new(OS_RELEASE),
        Path::new(KERNEL_OSRELEASE),
        runner,
    )
}

/// Probe with injectable identification files (tests point these at
/// fixtures).
pub fn probe_at(
    os_release: &Path,
    kernel_osrelease: &Path,
    runner: &dyn Runner,
) -> Result<HostFacts, DevupError> {
    let os_family = read_os_family(os_release)?;
    let wsl = read_wsl(kernel_osrelease);
    let backends = Backends {
        apt: runner.exists("apt-get"),
        snap: runner.exists("snap"),
    };
    tracing::debug!(target: TARGET, ?os_family, wsl, ?backends, "host facts");
    Ok(HostFacts {
        os_family,
        wsl,
        backends,
    })
}

/// A missing or unreadable release file is "unsupported", not "retry".
fn read_os_family(path: &Path) -> Result<OsFamily, DevupError> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        DevupError::unsupported_host(format!("cannot read {}", path.display()))
    })?;

    let mut id = None;
    let mut id_like = None;
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(unquote(value).to_ascii_lowercase());
        } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
            id_like = Some(unquote(value).to_ascii_lowercase());
        }
    }

    let id = id.unwrap_or_default();
    let id_like = id_like.unwrap_or_default();
    if id == "ubuntu" || id_like.split_whitespace().any(|family| family == "ubuntu") {
        Ok(OsFamily::Ubuntu)
    } else {
        Err(DevupError::unsupported_host(format!(
            "os-release ID `{id}` is not in the Ubuntu family"
        )))
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

/// A Linux-on-Windows compatibility layer announces itself in the kernel
/// release string. An unreadable file means a regular kernel.
fn read_wsl(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(release) => {
            let release = release.to_ascii_lowercase();
            release.contains("microsoft") || release.contains("wsl")
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::ScriptedRunner;
    use std::io::Write;

    fn fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn ubuntu_id_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = fixture(&dir, "os-release", "NAME=\"Ubuntu\"\nID=ubuntu\n");
        let kernel = fixture(&dir, "osrelease", "6.8.0-45-generic\n");
        let runner = ScriptedRunner {
            on_path: vec!["apt-get"],
            ..Default::default()
        };
        let facts = probe_at(&os_release, &kernel, &runner).unwrap();
        assert_eq!(facts.os_family, OsFamily::Ubuntu);
        assert!(!facts.wsl);
        assert!(facts.backends.apt);
        assert!(!facts.backends.snap);
    }

    #[test]
    fn ubuntu_derivative_is_supported_via_id_like() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = fixture(&dir, "os-release", "ID=pop\nID_LIKE=\"ubuntu debian\"\n");
        let kernel = fixture(&dir, "osrelease", "6.8.0-45-generic\n");
        let runner = ScriptedRunner::default();
        assert!(probe_at(&os_release, &kernel, &runner).is_ok());
    }

    #[test]
    fn non_ubuntu_family_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = fixture(&dir, "os-release", "ID=fedora\n");
        let kernel = fixture(&dir, "osrelease", "6.8.0\n");
        let runner = ScriptedRunner::default();
        let err = probe_at(&os_release, &kernel, &runner).unwrap_err();
        assert!(matches!(err, DevupError::UnsupportedHost { .. }));
    }

    #[test]
    fn missing_os_release_is_rejected_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = fixture(&dir, "osrelease", "6.8.0\n");
        let runner = ScriptedRunner::default();
        let err = probe_at(&dir.path().join("missing"), &kernel, &runner).unwrap_err();
        assert!(matches!(err, DevupError::UnsupportedHost { .. }));
    }

    #[test]
    fn wsl_kernel_string_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = fixture(&dir, "os-release", "ID=ubuntu\n");
        let kernel = fixture(
            &dir,
            "osrelease",
            "5.15.153.1-microsoft-standard-WSL2\n",
        );
        let runner = ScriptedRunner::default();
        let facts = probe_at(&os_release, &kernel, &runner).unwrap();
        assert!(facts.wsl);
    }

    #[test]
    fn unreadable_kernel_release_means_not_wsl() {
        let dir = tempfile::tempdir().unwrap();
        let os_release = fixture(&dir, "os-release", "ID=ubuntu\n");
        let runner = ScriptedRunner::default();
        let facts = probe_at(&os_release, &dir.path().join("missing"), &runner).unwrap();
        assert!(!facts.wsl);
    }
}
