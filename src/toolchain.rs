use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Environment keys the sourcing subshell changes on its own; never part of
/// the script's overlay.
const SHELL_NOISE: &[&str] = &["_", "SHLVL", "PWD", "OLDPWD"];

/// Handle to the externally provisioned cross-toolchain package.
#[derive(Debug, Clone)]
pub struct Toolchain {
    dir: PathBuf,
}

impl Toolchain {
    pub fn new(dir: PathBuf) -> Toolchain {
        Toolchain { dir }
    }

    /// The directory holding the cross tool binaries, prefixed onto `PATH`
    /// for configure and build steps.
    pub fn bin_dir(&self) -> PathBuf {
        self.dir.join("bin")
    }

    /// The target-specific system include directory shipped with the
    /// toolchain (e.g. `<dir>/armv6-nodeos-linux-gnueabi/include`).
    pub fn target_include_dir(&self, target: &str) -> PathBuf {
        self.dir.join(target).join("include")
    }

    /// Provision the toolchain by running the package's own install step.
    ///
    /// `CPU`, `BITS` and `MACHINE` are forwarded from the ambient
    /// environment when set so the package builds for the requested target.
    pub fn provision(&self) -> Result<()> {
        which::which("npm")
            .context("npm not found on PATH (needed to provision the cross-toolchain)")?;

        if !self.dir.exists() {
            bail!(
                "toolchain package not found at {} (install project dependencies first)",
                self.dir.display()
            );
        }

        let mut cmd = Command::new("npm");
        cmd.current_dir(&self.dir).args(["install", "--production"]);

        for key in ["CPU", "BITS", "MACHINE"] {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }

        debug!(dir = %self.dir.display(), "provisioning cross-toolchain");

        let status = cmd
            .status()
            .context("failed to run npm install for the cross-toolchain")?;

        if !status.success() {
            bail!("toolchain provisioning failed with {status}");
        }

        Ok(())
    }

    /// Source the toolchain's environment-adjustment script in a subshell
    /// and return the target environment it derives.
    ///
    /// The orchestrator's own environment is never modified; the overlay is
    /// passed explicitly to every child process that needs it.
    pub fn derive_env(&self) -> Result<TargetEnv> {
        let script = self.dir.join("scripts").join("adjustEnvVars.sh");
        if !script.exists() {
            bail!(
                "toolchain environment script not found at {} (run the `toolchain` task first)",
                script.display()
            );
        }

        let output = Command::new("sh")
            .arg("-c")
            .arg(format!(". '{}' >/dev/null && env", script.display()))
            .current_dir(&self.dir)
            .output()
            .context("spawning sh to source the toolchain environment script")?;

        if !output.status.success() {
            bail!(
                "toolchain environment script failed with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let sourced = parse_env_output(&String::from_utf8_lossy(&output.stdout));
        let overlay = diff_ambient(&sourced);

        TargetEnv::new(&sourced, overlay)
    }
}

/// Parse `env` output into a key-value map.
///
/// Continuation lines of multi-line values carry no `=` and are skipped;
/// none of the toolchain variables are multi-line.
fn parse_env_output(output: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            vars.insert(key.to_string(), value.to_string());
        }
    }
    vars
}

/// Keep only the variables the script introduced or changed relative to the
/// ambient process environment.
fn diff_ambient(sourced: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut overlay = BTreeMap::new();
    for (key, value) in sourced {
        if SHELL_NOISE.contains(&key.as_str()) {
            continue;
        }
        match std::env::var(key) {
            Ok(ambient) if ambient == *value => {}
            _ => {
                overlay.insert(key.clone(), value.clone());
            }
        }
    }
    overlay
}

/// The target descriptor produced by the toolchain's environment script,
/// plus the raw variable overlay for child processes.
#[derive(Debug, Clone)]
pub struct TargetEnv {
    pub cpu: String,
    pub host: String,
    pub target: String,
    pub bits: Option<String>,
    pub machine: Option<String>,
    vars: BTreeMap<String, String>,
}

impl TargetEnv {
    /// Build a target environment from the full sourced variable set and
    /// the overlay it introduced. `CPU`, `HOST` and `TARGET` are mandatory.
    pub fn new(
        sourced: &BTreeMap<String, String>,
        overlay: BTreeMap<String, String>,
    ) -> Result<TargetEnv> {
        let mandatory = |key: &str| -> Result<String> {
            sourced
                .get(key)
                .cloned()
                .with_context(|| format!("toolchain environment script did not set {key}"))
        };

        Ok(TargetEnv {
            cpu: mandatory("CPU")?,
            host: mandatory("HOST")?,
            target: mandatory("TARGET")?,
            bits: sourced.get("BITS").cloned(),
            machine: sourced.get("MACHINE").cloned(),
            vars: overlay,
        })
    }

    /// The variable overlay to inject into child processes.
    pub fn vars(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }
}
