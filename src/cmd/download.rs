use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use tar::Archive;
use tracing::debug;

use crate::ctx::Ctx;
use crate::vendor::Dep;

/// Fetch a dependency's release tarball and unpack it into its fixed
/// source directory, dropping the archive's top-level directory so the
/// sources land directly under `deps/<name>`.
pub fn fetch(ctx: &Ctx, dep: Dep) -> Result<()> {
    let url = ctx.versions().download_url(dep);
    let dest = dep.src_dir(ctx.root());

    debug!(dep = %dep, url = %url, "download");

    fs::create_dir_all(&dest)
        .with_context(|| format!("creating source dir {}", dest.display()))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("{dep}-{}", ctx.versions().version(dep)));

    let response = reqwest::blocking::get(&url).with_context(|| format!("fetching {url}"))?;

    if !response.status().is_success() {
        bail!(
            "failed to download {dep} from {url}: HTTP {}",
            response.status()
        );
    }

    let bytes = response.bytes().context("reading response body")?;
    unpack_strip_root(bytes.as_ref(), &dest)
        .with_context(|| format!("extracting {dep} to {}", dest.display()))?;

    pb.finish_with_message(format!("{dep}-{} ✓", ctx.versions().version(dep)));

    Ok(())
}

/// Unpack a gzipped tarball, stripping the single top-level directory
/// component from every entry.
fn unpack_strip_root(bytes: &[u8], dest: &Path) -> Result<()> {
    let gz = GzDecoder::new(bytes);
    let mut archive = Archive::new(gz);

    for entry in archive.entries().context("reading tar entries")? {
        let mut entry = entry.context("reading tar entry")?;
        let path = entry.path().context("reading entry path")?.into_owned();

        let mut components = path.components();
        components.next();
        let stripped: PathBuf = components.as_path().to_path_buf();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&stripped);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        entry
            .unpack(&target)
            .with_context(|| format!("unpacking {}", target.display()))?;
    }

    Ok(())
}
