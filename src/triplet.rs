use std::env;
use std::fmt;

use crate::error::{Error, Result};

/// Linkage flavour of a vcpkg triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Dynamic,
    Static,
}

/// Canonical vcpkg triplet used to locate a prebuilt library tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triplet {
    Arm64Osx,
    X64Osx,
    X64Linux,
}

impl Triplet {
    /// Map an OS name and machine architecture onto a triplet.
    ///
    /// Anything that is neither macOS nor Windows falls back to the Linux
    /// x64 triplet, matching the prebuilt trees the project ships.
    pub fn resolve(os: &str, arch: &str) -> Result<Self> {
        let os = normalize(os);
        if os.starts_with("win") {
            return Err(Error::UnsupportedPlatform { os });
        }

        if os == "macos" || os.starts_with("darwin") {
            let arch = normalize(arch);
            if arch.starts_with("arm64") || arch.starts_with("aarch64") {
                return Ok(Triplet::Arm64Osx);
            }
            return Ok(Triplet::X64Osx);
        }

        Ok(Triplet::X64Linux)
    }

    /// Resolve the triplet for the running host.
    pub fn host() -> Result<Self> {
        Self::resolve(env::consts::OS, env::consts::ARCH)
    }

    pub fn tag(self, linkage: Linkage) -> &'static str {
        match (self, linkage) {
            (Triplet::Arm64Osx, Linkage::Dynamic) => "arm64-osx-dynamic",
            (Triplet::Arm64Osx, Linkage::Static) => "arm64-osx",
            (Triplet::X64Osx, Linkage::Dynamic) => "x64-osx-dynamic",
            (Triplet::X64Osx, Linkage::Static) => "x64-osx",
            (Triplet::X64Linux, Linkage::Dynamic) => "x64-linux-dynamic",
            (Triplet::X64Linux, Linkage::Static) => "x64-linux",
        }
    }

    pub fn dynamic(self) -> &'static str {
        self.tag(Linkage::Dynamic)
    }

    pub fn static_tag(self) -> &'static str {
        self.tag(Linkage::Static)
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dynamic())
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
