use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing::info;

use crate::layout::Layout;
use crate::platform::HostPlatform;
use crate::toolchain::{TargetEnv, Toolchain};
use crate::vendor::Versions;

/// Everything derived from the toolchain's environment script: the target
/// descriptor and the path layout keyed by its CPU.
#[derive(Debug)]
pub struct Derived {
    pub target: TargetEnv,
    pub layout: Layout,
}

/// Immutable execution context shared by all tasks.
pub struct Ctx {
    root: PathBuf,
    toolchain: Toolchain,
    versions: Versions,
    jobs: usize,
    derived: OnceLock<Derived>,
}

impl Ctx {
    pub fn new(root: PathBuf, toolchain: Toolchain, versions: Versions) -> Ctx {
        let jobs = std::env::var("JOBS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            });

        Ctx {
            root,
            toolchain,
            versions,
            jobs,
            derived: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn versions(&self) -> &Versions {
        &self.versions
    }

    /// Parallelism passed to `make -j`.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// The `env` task: resolve the host platform, derive the target
    /// environment and compute the path layout.
    ///
    /// Derivation is deterministic within a process, so a second run is a
    /// no-op; workflows composed from smaller workflows share one result.
    pub fn derive_target(&self) -> Result<()> {
        if self.derived.get().is_some() {
            return Ok(());
        }

        let platform = HostPlatform::detect()?;
        info!(platform = %platform, "resolved host platform");

        let target = self.toolchain.derive_env()?;
        let layout = Layout::new(&self.root, &target.cpu);
        info!(
            cpu = %target.cpu,
            target = %target.target,
            bits = ?target.bits,
            machine = ?target.machine,
            "derived target environment"
        );
        info!(
            obj_dir = %layout.obj_dir.display(),
            out_dir = %layout.out_dir.display(),
            "computed path table"
        );

        let _ = self.derived.set(Derived { target, layout });
        Ok(())
    }

    pub fn derived(&self) -> Result<&Derived> {
        self.derived
            .get()
            .context("target environment not derived (the `env` task must run first)")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_is_an_error_before_the_env_task_runs() {
        let ctx = testutil::bare_ctx();
        let err = ctx.derived().unwrap_err();
        assert!(err.to_string().contains("env"));
    }

    #[test]
    fn derive_target_populates_target_and_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = testutil::derived_ctx(tmp.path());

        let derived = ctx.derived().unwrap();
        assert_eq!(derived.target.cpu, "arm");
        assert_eq!(derived.layout.out_dir, tmp.path().join("out").join("arm"));
    }

    #[test]
    fn repeated_derivation_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = testutil::derived_ctx(tmp.path());

        ctx.derive_target().unwrap();
        assert_eq!(ctx.derived().unwrap().target.cpu, "arm");
    }
}
