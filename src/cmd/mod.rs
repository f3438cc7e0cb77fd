pub mod build;
pub mod clean;
pub mod download;
pub mod prepare;

use crate::toolchain::Toolchain;

/// `PATH` with the toolchain binary directory prepended, so configure and
/// make resolve the cross tools first.
pub(crate) fn path_with_toolchain(toolchain: &Toolchain) -> String {
    let bin = toolchain.bin_dir();
    match std::env::var("PATH") {
        Ok(path) => format!("{}:{path}", bin.display()),
        Err(_) => bin.display().to_string(),
    }
}
