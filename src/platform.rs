use std::fmt;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// The normalized host platform tag, as the toolchain scripts spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    Freebsd,
    Win,
    Darwin,
    Solaris,
}

impl HostPlatform {
    /// Resolve a kernel name (the output of `uname -s`) to a platform tag.
    ///
    /// AIX hosts use the linux toolchain and map to the same tag.
    pub fn from_sysname(sysname: &str) -> Result<HostPlatform> {
        match sysname.trim() {
            "Linux" => Ok(HostPlatform::Linux),
            "FreeBSD" => Ok(HostPlatform::Freebsd),
            "WindowsNT" => Ok(HostPlatform::Win),
            "Darwin" => Ok(HostPlatform::Darwin),
            "SunOS" => Ok(HostPlatform::Solaris),
            "AIX" => Ok(HostPlatform::Linux),
            other => bail!("unknown OS: {other}"),
        }
    }

    /// Detect the platform of the machine we are running on.
    pub fn detect() -> Result<HostPlatform> {
        let output = Command::new("uname")
            .arg("-s")
            .output()
            .context("running uname -s")?;

        if !output.status.success() {
            bail!("uname -s failed with {}", output.status);
        }

        Self::from_sysname(&String::from_utf8_lossy(&output.stdout))
    }

    pub fn tag(self) -> &'static str {
        match self {
            HostPlatform::Linux => "linux",
            HostPlatform::Freebsd => "freebsd",
            HostPlatform::Win => "win",
            HostPlatform::Darwin => "darwin",
            HostPlatform::Solaris => "solaris",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
