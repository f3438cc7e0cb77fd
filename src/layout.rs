use std::path::{Path, PathBuf};

use crate::vendor::Dep;

/// Filesystem layout for a build, keyed by the resolved target CPU.
///
/// Computed once after the target environment is derived; a pure function
/// of the project root and CPU, read-only thereafter.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    /// Build scratch directory for the target CPU.
    pub obj_dir: PathBuf,
    /// Install prefix root; each dependency stages into its own
    /// subdirectory here.
    pub out_dir: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, cpu: &str) -> Layout {
        Layout {
            root: root.to_path_buf(),
            obj_dir: root.join("build").join(cpu),
            out_dir: root.join("out").join(cpu),
        }
    }

    pub fn src_dir(&self, dep: Dep) -> PathBuf {
        dep.src_dir(&self.root)
    }

    /// The install prefix a dependency's artifacts are staged under.
    pub fn prefix(&self, dep: Dep) -> PathBuf {
        self.out_dir.join(dep.name())
    }
}
