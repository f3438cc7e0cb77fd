mod cmd;
mod ctx;
mod graph;
mod layout;
mod platform;
mod toolchain;
mod vendor;
mod workflows;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use crate::ctx::Ctx;
use crate::graph::Task;
use crate::toolchain::Toolchain;
use crate::vendor::Versions;

/// Setup logging based on verbose flag or RUST_LOG environment variable
fn setup_logging(verbose: bool) {
    // RUST_LOG env var takes precedence if set
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("curl_cross=debug")
    } else {
        EnvFilter::new("curl_cross=info")
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

#[derive(Parser)]
#[command(name = "curl-cross")]
#[command(version, about = "Cross-compile static curl, OpenSSL and zlib for native module builds", long_about = None)]
struct Cli {
    /// Root of the externally provisioned cross-toolchain package
    #[arg(
        long,
        env = "TOOLCHAIN_PATH",
        default_value = "node_modules/nodeos-cross-toolchain",
        global = true
    )]
    toolchain_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Task to run; the full configure-and-build pipeline when omitted
    #[command(subcommand)]
    task: Option<Tasks>,
}

#[derive(Subcommand)]
enum Tasks {
    /// Remove the build/, deps/ and out/ working directories
    Clean,

    /// Download and unpack the curl source release
    DownloadCurl,

    /// Download and unpack the OpenSSL source release
    DownloadOpenssl,

    /// Download and unpack the zlib source release
    DownloadZlib,

    /// Download all three dependencies concurrently
    Download,

    /// Configure curl against the staged OpenSSL and zlib outputs
    PrepareCurl,

    /// Configure OpenSSL for a static cross build
    PrepareOpenssl,

    /// Configure zlib for a static cross build
    PrepareZlib,

    /// Configure all dependencies in dependency order
    Prepare,

    /// Provision the cross-toolchain for the requested CPU
    Toolchain,

    /// Full configure pipeline: clean, toolchain, download, prepare
    Configure,

    /// Build and install zlib
    BuildZlib,

    /// Build and install OpenSSL
    BuildOpenssl,

    /// Build and install curl
    BuildCurl,

    /// Build all dependencies in dependency order
    Build,

    /// Placeholder for prebuilt bundles
    Prebuilt,

    /// Run the configure workflow, then the build workflow
    Default,
}

fn workflow_for(task: Tasks) -> Task {
    use workflows::*;

    match task {
        Tasks::Clean => clean(),
        Tasks::DownloadCurl => download_curl(),
        Tasks::DownloadOpenssl => download_openssl(),
        Tasks::DownloadZlib => download_zlib(),
        Tasks::Download => download(),
        Tasks::PrepareCurl => with_env(prepare_curl()),
        Tasks::PrepareOpenssl => with_env(prepare_openssl()),
        Tasks::PrepareZlib => with_env(prepare_zlib()),
        Tasks::Prepare => prepare(),
        Tasks::Toolchain => toolchain(),
        Tasks::Configure => configure(),
        Tasks::BuildZlib => with_env(build_zlib()),
        Tasks::BuildOpenssl => with_env(build_openssl()),
        Tasks::BuildCurl => with_env(build_curl()),
        Tasks::Build => build(),
        Tasks::Prebuilt => prebuilt(),
        Tasks::Default => default(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let root = std::env::current_dir().context("determining the working directory")?;
    let ctx = Ctx::new(
        root,
        Toolchain::new(cli.toolchain_dir),
        Versions::from_manifest()?,
    );

    workflow_for(cli.task.unwrap_or(Tasks::Default)).run(&ctx)
}
