//! Development environment for MXL.
//!
//! Derives the environment variables needed to build against the libraries
//! vcpkg installed for this platform, renders the variables it changed, and
//! launches shells inside the result.

pub mod cli;
pub mod commands;
pub mod ui;

mod config;
mod derivation;
mod environment;
mod error;
mod export;
mod launcher;
mod scanner;
mod triplet;

pub use config::Config;
pub use derivation::{derive, vars, BuildMode, DeriveOptions, PixbufProbe, PkgConfigProbe};
pub use environment::{Environment, PathFragmentSet, PATH_SEPARATOR};
pub use error::{Error, Result};
pub use export::{render, shell_quote, EnvironmentDelta, ExportFormat};
pub use launcher::{interactive_shell, launch, LaunchOptions, Session, ShellAdapter};
pub use scanner::{scan_tools, ToolDirectory};
pub use triplet::{Linkage, Triplet};
