use std::fs;
use std::io;

use anyhow::{Context, Result};
use tracing::debug;

use crate::ctx::Ctx;

/// Remove the working directories. Missing directories are fine; a
/// repeated clean is a no-op.
pub fn run(ctx: &Ctx) -> Result<()> {
    debug!("remove build/ deps/ out/");

    for dir in ["build", "deps", "out"] {
        let path = ctx.root().join(dir);
        match fs::remove_dir_all(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("removing {}", path.display()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::{testutil, Ctx};
    use crate::toolchain::Toolchain;

    fn ctx_at(root: &std::path::Path) -> Ctx {
        Ctx::new(
            root.to_path_buf(),
            Toolchain::new(root.join("toolchain")),
            testutil::stub_versions(),
        )
    }

    #[test]
    fn succeeds_when_nothing_exists() {
        let tmp = tempfile::tempdir().unwrap();
        run(&ctx_at(tmp.path())).unwrap();
    }

    #[test]
    fn removes_the_working_directories() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["build/arm", "deps/curl", "out/arm/zlib"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }

        run(&ctx_at(tmp.path())).unwrap();

        assert!(!tmp.path().join("build").exists());
        assert!(!tmp.path().join("deps").exists());
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn leaves_unrelated_entries_alone() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("deps")).unwrap();
        fs::write(tmp.path().join("keep.txt"), "x").unwrap();

        run(&ctx_at(tmp.path())).unwrap();

        assert!(tmp.path().join("keep.txt").exists());
    }
}
