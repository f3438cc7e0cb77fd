//! The task graph: one constructor per named task, composed into the
//! `clean`/`configure`/`build`/`default` workflows.
//!
//! Ordering here is load-bearing. curl's configure consumes the staged
//! openssl and zlib outputs, so the prepare and build sequences are fixed,
//! and only the download tasks (which touch disjoint directories and no
//! environment) run concurrently.

use crate::cmd;
use crate::graph::Task;
use crate::vendor::Dep;

/// Explicit environment-derivation prerequisite. Every workflow that needs
/// the target descriptor or path layout runs this first.
pub fn env() -> Task {
    Task::leaf("env", |ctx| ctx.derive_target())
}

/// Wrap a single task so it can run standalone.
pub fn with_env(task: Task) -> Task {
    Task::series(vec![env(), task])
}

pub fn clean() -> Task {
    Task::leaf("clean", cmd::clean::run)
}

pub fn toolchain() -> Task {
    Task::leaf("toolchain", |ctx| ctx.toolchain().provision())
}

pub fn download_curl() -> Task {
    Task::leaf("download-curl", |ctx| cmd::download::fetch(ctx, Dep::Curl))
}

pub fn download_openssl() -> Task {
    Task::leaf("download-openssl", |ctx| {
        cmd::download::fetch(ctx, Dep::Openssl)
    })
}

pub fn download_zlib() -> Task {
    Task::leaf("download-zlib", |ctx| cmd::download::fetch(ctx, Dep::Zlib))
}

pub fn download() -> Task {
    Task::parallel(vec![download_openssl(), download_zlib(), download_curl()])
}

pub fn prepare_curl() -> Task {
    Task::leaf("prepare-curl", cmd::prepare::curl)
}

pub fn prepare_openssl() -> Task {
    Task::leaf("prepare-openssl", cmd::prepare::openssl)
}

pub fn prepare_zlib() -> Task {
    Task::leaf("prepare-zlib", cmd::prepare::zlib)
}

pub fn prepare() -> Task {
    Task::series(vec![
        env(),
        prepare_openssl(),
        prepare_zlib(),
        prepare_curl(),
    ])
}

pub fn configure() -> Task {
    Task::series(vec![
        clean(),
        toolchain(),
        env(),
        download(),
        prepare_openssl(),
        prepare_zlib(),
        prepare_curl(),
    ])
}

pub fn build_zlib() -> Task {
    Task::leaf("build-zlib", cmd::build::zlib)
}

pub fn build_openssl() -> Task {
    Task::leaf("build-openssl", cmd::build::openssl)
}

pub fn build_curl() -> Task {
    Task::leaf("build-curl", cmd::build::curl)
}

pub fn build() -> Task {
    Task::series(vec![env(), build_zlib(), build_openssl(), build_curl()])
}

/// Placeholder for publishing prebuilt bundles; nothing is published yet.
pub fn prebuilt() -> Task {
    Task::leaf("prebuilt", |_| Ok(()))
}

pub fn default() -> Task {
    Task::series(vec![configure(), build()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_name(task: &Task) -> &'static str {
        match task {
            Task::Leaf { name, .. } => name,
            _ => panic!("expected a leaf task"),
        }
    }

    fn leaf_names(tasks: &[Task]) -> Vec<&'static str> {
        tasks.iter().map(leaf_name).collect()
    }

    #[test]
    fn download_runs_all_three_fetches_concurrently() {
        let Task::Parallel(tasks) = download() else {
            panic!("expected a parallel group");
        };

        let mut names = leaf_names(&tasks);
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["download-curl", "download-openssl", "download-zlib"]
        );
    }

    #[test]
    fn prepare_order_is_openssl_zlib_curl() {
        let Task::Series(tasks) = prepare() else {
            panic!("expected a series");
        };

        assert_eq!(
            leaf_names(&tasks),
            vec!["env", "prepare-openssl", "prepare-zlib", "prepare-curl"]
        );
    }

    #[test]
    fn configure_runs_clean_toolchain_download_then_prepare() {
        let Task::Series(tasks) = configure() else {
            panic!("expected a series");
        };

        assert_eq!(tasks.len(), 7);
        assert_eq!(leaf_name(&tasks[0]), "clean");
        assert_eq!(leaf_name(&tasks[1]), "toolchain");
        assert_eq!(leaf_name(&tasks[2]), "env");

        let Task::Parallel(downloads) = &tasks[3] else {
            panic!("downloads must run as a parallel group");
        };
        let mut names = leaf_names(downloads);
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["download-curl", "download-openssl", "download-zlib"]
        );

        assert_eq!(
            leaf_names(&tasks[4..]),
            vec!["prepare-openssl", "prepare-zlib", "prepare-curl"]
        );
    }

    #[test]
    fn build_order_is_zlib_openssl_curl() {
        let Task::Series(tasks) = build() else {
            panic!("expected a series");
        };

        assert_eq!(
            leaf_names(&tasks),
            vec!["env", "build-zlib", "build-openssl", "build-curl"]
        );
    }

    #[test]
    fn default_is_configure_then_build() {
        let Task::Series(tasks) = default() else {
            panic!("expected a series");
        };

        assert_eq!(tasks.len(), 2);
        let Task::Series(first) = &tasks[0] else {
            panic!("expected the configure series");
        };
        let Task::Series(second) = &tasks[1] else {
            panic!("expected the build series");
        };

        assert_eq!(leaf_name(&first[0]), "clean");
        assert_eq!(leaf_name(&second[1]), "build-zlib");
    }

    #[test]
    fn standalone_tasks_get_an_env_prerequisite() {
        let Task::Series(tasks) = with_env(prepare_curl()) else {
            panic!("expected a series");
        };

        assert_eq!(leaf_names(&tasks), vec!["env", "prepare-curl"]);
    }
}
