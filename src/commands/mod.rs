use crate::cli::{Cli, Mode};
use crate::config::{Config, DEFAULT_INSTALL_ROOT};
use crate::derivation::{derive, BuildMode, DeriveOptions, PkgConfigProbe};
use crate::environment::Environment;
use crate::launcher::DEFAULT_PROMPT_MARKER;
use anyhow::{Context, Result};
use std::path::{self, PathBuf};

mod env;
mod shell;
mod triplet;

/// Run the invocation described by `cli` and return the process exit code.
pub fn execute(cli: Cli) -> Result<i32> {
    let config = Config::load_default()?;
    let settings = Settings::resolve(&cli, config)?;

    match cli.mode() {
        Mode::Triplet(linkage) => triplet::execute(linkage),
        Mode::Print(format) => env::execute(&settings, format),
        Mode::Session => shell::execute(&settings, cli.command),
    }
}

/// Command line merged over the config file over built-in defaults.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub install_root: PathBuf,
    pub build_mode: BuildMode,
    pub prompt_marker: String,
    pub default_shell: Option<String>,
}

impl Settings {
    /// Relative install roots are taken against the current directory so the
    /// derived paths stay valid after the session changes directory.
    fn resolve(cli: &Cli, config: Config) -> Result<Self> {
        let install_root = cli
            .install_root
            .clone()
            .or(config.install_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_ROOT));
        let install_root = path::absolute(&install_root)
            .with_context(|| format!("Failed to resolve install root {:?}", install_root))?;

        Ok(Self {
            install_root,
            build_mode: cli
                .requested_build_mode()
                .or(config.build_mode)
                .unwrap_or_default(),
            prompt_marker: config
                .prompt_marker
                .unwrap_or_else(|| DEFAULT_PROMPT_MARKER.to_string()),
            default_shell: config.default_shell,
        })
    }

    /// Snapshot this process's environment and derive the development one from it.
    fn environments(&self) -> Result<(Environment, Environment)> {
        let options = DeriveOptions::for_host(self.build_mode)?;
        let base = Environment::from_process();
        tracing::debug!(
            root = ?self.install_root,
            triplet = %options.triplet,
            "Deriving MXL environment"
        );
        let derived = derive(&base, &self.install_root, &options, &PkgConfigProbe);
        Ok((base, derived))
    }
}
