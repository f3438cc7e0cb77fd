use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::ctx::Ctx;
use crate::vendor::Dep;

use super::path_with_toolchain;

/// Run `make` then `make install` for a dependency under the toolchain
/// `PATH` overlay. Each later build links against the artifacts the
/// earlier ones staged, so callers must keep the zlib, openssl, curl
/// order.
fn build_dep(ctx: &Ctx, dep: Dep) -> Result<()> {
    which::which("make").context("make not found on PATH")?;

    let derived = ctx.derived()?;
    let src = derived.layout.src_dir(dep);
    let jobs = format!("-j{}", ctx.jobs());

    debug!(dep = %dep, "build {dep}");

    for install in [false, true] {
        let mut cmd = Command::new("make");
        cmd.current_dir(&src);
        if install {
            cmd.arg("install");
        }
        cmd.arg(&jobs);

        cmd.envs(derived.target.vars());
        cmd.env("PATH", path_with_toolchain(ctx.toolchain()));

        let what = if install { "make install" } else { "make" };
        let status = cmd
            .status()
            .with_context(|| format!("failed to run {what} in {}", src.display()))?;

        if !status.success() {
            bail!("{dep} {what} failed with {status}");
        }
    }

    Ok(())
}

pub fn zlib(ctx: &Ctx) -> Result<()> {
    build_dep(ctx, Dep::Zlib)
}

pub fn openssl(ctx: &Ctx) -> Result<()> {
    build_dep(ctx, Dep::Openssl)
}

pub fn curl(ctx: &Ctx) -> Result<()> {
    build_dep(ctx, Dep::Curl)
}
