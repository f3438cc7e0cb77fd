use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::ctx::{Ctx, Derived};
use crate::layout::Layout;
use crate::toolchain::{TargetEnv, Toolchain};
use crate::vendor::Dep;

use super::path_with_toolchain;

/// Cross tool names derived from the target triplet, shared by every
/// configure step. Built once per task and passed to the child process;
/// the orchestrator's own environment is never touched.
fn cross_tool_env(toolchain: &Toolchain, target: &TargetEnv) -> Vec<(String, String)> {
    let t = &target.target;
    vec![
        ("CC".into(), format!("{t}-gcc")),
        ("AR".into(), format!("{t}-ar")),
        ("AS".into(), format!("{t}-as")),
        ("LD".into(), format!("{t}-ld")),
        ("NM".into(), format!("{t}-nm")),
        ("RANLIB".into(), format!("{t}-ranlib")),
        ("PATH".into(), path_with_toolchain(toolchain)),
    ]
}

fn openssl_args(layout: &Layout, target: &TargetEnv) -> Vec<String> {
    let prefix = layout.prefix(Dep::Openssl);
    vec![
        format!("--openssldir={}", prefix.display()),
        format!("--prefix={}", prefix.display()),
        format!("os/compiler:{}-", target.host),
    ]
}

fn zlib_args(layout: &Layout) -> Vec<String> {
    vec![
        format!("--prefix={}", layout.prefix(Dep::Zlib).display()),
        "--static".into(),
    ]
}

fn curl_args(layout: &Layout, target: &TargetEnv) -> Vec<String> {
    vec![
        format!("--host={}", target.host),
        format!("--target={}", target.target),
        format!("--prefix={}", layout.prefix(Dep::Curl).display()),
        "--with-random=/dev/urandom".into(),
        "--disable-manual".into(),
        "--disable-shared".into(),
        "--enable-static".into(),
        "--disable-verbose".into(),
        "--disable-ipv6".into(),
        "--with-ssl".into(),
        "--with-zlib".into(),
        "--silent".into(),
    ]
}

/// curl's configure needs the staged openssl and zlib headers and
/// archives, plus the toolchain's own system headers.
fn curl_flags(toolchain: &Toolchain, derived: &Derived) -> Vec<(String, String)> {
    let layout = &derived.layout;
    let cppflags = format!(
        "-I{} -I{} -I{}",
        layout.prefix(Dep::Openssl).join("include").display(),
        layout.prefix(Dep::Zlib).join("include").display(),
        toolchain.target_include_dir(&derived.target.target).display(),
    );
    let ldflags = format!(
        "-L{} -L{}",
        layout.prefix(Dep::Openssl).join("lib").display(),
        layout.prefix(Dep::Zlib).join("lib").display(),
    );
    vec![("CPPFLAGS".into(), cppflags), ("LDFLAGS".into(), ldflags)]
}

fn run_configure(
    ctx: &Ctx,
    dep: Dep,
    script: &str,
    args: Vec<String>,
    extra_env: Vec<(String, String)>,
) -> Result<()> {
    let derived = ctx.derived()?;
    let src = derived.layout.src_dir(dep);

    debug!(dep = %dep, "prepare {dep} environment");

    let mut cmd = Command::new(src.join(script));
    cmd.current_dir(&src).args(&args);

    // Overlay order: script-derived vars, then the shared cross tools,
    // then dependency-specific flags. Later keys win.
    cmd.envs(derived.target.vars());
    cmd.envs(cross_tool_env(ctx.toolchain(), &derived.target));
    cmd.envs(extra_env);

    let status = cmd
        .status()
        .with_context(|| format!("failed to run {script} in {}", src.display()))?;

    if !status.success() {
        bail!("{dep} configure failed with {status}");
    }

    Ok(())
}

pub fn openssl(ctx: &Ctx) -> Result<()> {
    let derived = ctx.derived()?;
    let target = &derived.target;
    let env = vec![
        ("CROSS".into(), target.target.clone()),
        ("TARGETMACH".into(), target.target.clone()),
        ("BUILDMACH".into(), target.host.clone()),
        (
            "CPPFLAGS".into(),
            format!(
                "-I{}",
                ctx.toolchain().target_include_dir(&target.target).display()
            ),
        ),
    ];
    let args = openssl_args(&derived.layout, target);
    run_configure(ctx, Dep::Openssl, "Configure", args, env)
}

pub fn zlib(ctx: &Ctx) -> Result<()> {
    let derived = ctx.derived()?;
    let target = &derived.target;
    let env = vec![
        ("CROSS".into(), target.target.clone()),
        ("BUILDMACH".into(), target.host.clone()),
        ("TARGETMACH".into(), target.target.clone()),
    ];
    let args = zlib_args(&derived.layout);
    run_configure(ctx, Dep::Zlib, "configure", args, env)
}

pub fn curl(ctx: &Ctx) -> Result<()> {
    let derived = ctx.derived()?;
    let mut env = vec![("CROSS_COMPILE".into(), derived.target.target.clone())];
    env.extend(curl_flags(ctx.toolchain(), derived));
    let args = curl_args(&derived.layout, &derived.target);
    run_configure(ctx, Dep::Curl, "configure", args, env)
}
