use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions raised while preparing or entering the environment.
///
/// Everything not listed here (missing install tree, missing tools
/// directory, failed pkg-config probe) degrades to a smaller environment
/// instead of failing.
#[derive(Debug, Error)]
pub enum Error {
    /// The host has no vcpkg triplet mapping.
    #[error("{os} is not a supported platform for the MXL development environment")]
    UnsupportedPlatform { os: String },

    /// The session program could not be started at all.
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The temporary bash startup file could not be prepared.
    #[error("Failed to prepare shell startup file {path:?}: {source}")]
    StartupFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process exit status used when this error terminates the program.
    ///
    /// Follows the shell convention of 127 for a missing program and 126
    /// for one that exists but cannot be executed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            Error::Spawn { .. } => 126,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_not_found_maps_to_127() {
        let err = Error::Spawn {
            program: "nope".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), 127);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn spawn_permission_denied_maps_to_126() {
        let err = Error::Spawn {
            program: "/etc/passwd".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.exit_code(), 126);
    }

    #[test]
    fn unsupported_platform_is_generic_failure() {
        let err = Error::UnsupportedPlatform {
            os: "windows".into(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("windows"));
    }
}
