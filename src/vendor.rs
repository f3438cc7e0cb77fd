use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// The three vendored C libraries this tool builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dep {
    Zlib,
    Openssl,
    Curl,
}

impl Dep {
    pub fn name(self) -> &'static str {
        match self {
            Dep::Zlib => "zlib",
            Dep::Openssl => "openssl",
            Dep::Curl => "curl",
        }
    }

    /// The fixed source directory a dependency is unpacked into.
    pub fn src_dir(self, root: &Path) -> PathBuf {
        root.join("deps").join(self.name())
    }
}

impl fmt::Display for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Upstream release versions, read from `[package.metadata.vendor]` in this
/// package's manifest. Used only to construct download URLs; archives are
/// not checksum-verified.
#[derive(Debug, Clone, Deserialize)]
pub struct Versions {
    pub curl: String,
    pub openssl: String,
    pub zlib: String,
}

#[derive(Deserialize)]
struct Manifest {
    package: ManifestPackage,
}

#[derive(Deserialize)]
struct ManifestPackage {
    metadata: ManifestMetadata,
}

#[derive(Deserialize)]
struct ManifestMetadata {
    vendor: Versions,
}

impl Versions {
    /// Load the versions embedded at compile time from Cargo.toml.
    pub fn from_manifest() -> Result<Versions> {
        let manifest: Manifest = toml::from_str(include_str!("../Cargo.toml"))
            .context("parsing [package.metadata.vendor] from Cargo.toml")?;
        Ok(manifest.package.metadata.vendor)
    }

    pub fn version(&self, dep: Dep) -> &str {
        match dep {
            Dep::Zlib => &self.zlib,
            Dep::Openssl => &self.openssl,
            Dep::Curl => &self.curl,
        }
    }

    /// The release tarball URL for a dependency.
    pub fn download_url(&self, dep: Dep) -> String {
        match dep {
            Dep::Curl => format!("https://curl.haxx.se/download/curl-{}.tar.gz", self.curl),
            Dep::Openssl => format!(
                "https://www.openssl.org/source/openssl-{}.tar.gz",
                self.openssl
            ),
            Dep::Zlib => format!("https://www.zlib.net/zlib-{}.tar.gz", self.zlib),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_carries_all_three_versions() {
        let versions = Versions::from_manifest().unwrap();
        assert!(!versions.curl.is_empty());
        assert!(!versions.openssl.is_empty());
        assert!(!versions.zlib.is_empty());
    }

    #[test]
    fn download_urls_embed_the_version() {
        let versions = Versions {
            curl: "7.61.0".into(),
            openssl: "1.1.0i".into(),
            zlib: "1.2.11".into(),
        };

        assert_eq!(
            versions.download_url(Dep::Curl),
            "https://curl.haxx.se/download/curl-7.61.0.tar.gz"
        );
        assert_eq!(
            versions.download_url(Dep::Openssl),
            "https://www.openssl.org/source/openssl-1.1.0i.tar.gz"
        );
        assert_eq!(
            versions.download_url(Dep::Zlib),
            "https://www.zlib.net/zlib-1.2.11.tar.gz"
        );
    }

    #[test]
    fn src_dirs_are_fixed_under_deps() {
        let root = Path::new("/project");
        assert_eq!(Dep::Curl.src_dir(root), Path::new("/project/deps/curl"));
        assert_eq!(Dep::Zlib.src_dir(root), Path::new("/project/deps/zlib"));
    }
}
