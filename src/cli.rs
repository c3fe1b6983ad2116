use clap::{ArgAction, ArgGroup, Parser};
use std::path::PathBuf;

use crate::derivation::BuildMode;
use crate::export::ExportFormat;
use crate::triplet::Linkage;

/// MXL development environment
///
/// mxl-env prepares the environment for building MXL against the libraries
/// vcpkg installed under `vcpkg_installed/<triplet>`. It either prints the
/// variables it adds (for shells, rust-analyzer or VS Code tasks) or starts
/// COMMAND, or your interactive shell, inside that environment.
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .args(["print_env", "print_rust_analyzer_env", "print_task_env", "print_triplet"])
        .multiple(false)
))]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Only print the environment and exit
    #[arg(long)]
    pub print_env: bool,

    /// Add an export statement for each printed variable (default)
    #[arg(long, overrides_with = "no_export_print_env")]
    pub export_print_env: bool,

    /// Print plain assignments without export statements
    #[arg(long, overrides_with = "export_print_env")]
    pub no_export_print_env: bool,

    /// Print the environment as rust-analyzer `cargo.extraEnv` settings
    #[arg(long)]
    pub print_rust_analyzer_env: bool,

    /// Print a VS Code tasks.json with the environment for `cargo build`
    #[arg(long)]
    pub print_task_env: bool,

    /// Print the vcpkg triplet for this platform and exit
    #[arg(long)]
    pub print_triplet: bool,

    /// With --print-triplet, print the static triplet instead
    #[arg(long = "static", requires = "print_triplet")]
    pub static_triplet: bool,

    /// Use the vcpkg debug libraries
    #[arg(long, conflicts_with = "build_mode")]
    pub vcpkg_debug: bool,

    /// Which vcpkg libraries to use
    #[arg(long, value_enum, value_name = "MODE")]
    pub build_mode: Option<BuildMode>,

    /// vcpkg install tree (default: ./vcpkg_installed)
    #[arg(long, value_name = "DIR", env = "MXL_VCPKG_INSTALLED")]
    pub install_root: Option<PathBuf>,

    /// Command to run instead of an interactive shell
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Print(ExportFormat),
    Triplet(Linkage),
    Session,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.print_triplet {
            let linkage = if self.static_triplet {
                Linkage::Static
            } else {
                Linkage::Dynamic
            };
            Mode::Triplet(linkage)
        } else if self.print_rust_analyzer_env {
            Mode::Print(ExportFormat::RustAnalyzer)
        } else if self.print_task_env {
            Mode::Print(ExportFormat::Task)
        } else if self.print_env {
            Mode::Print(ExportFormat::Shell {
                export: !self.no_export_print_env,
            })
        } else {
            Mode::Session
        }
    }

    /// Build mode requested on the command line, if any.
    pub fn requested_build_mode(&self) -> Option<BuildMode> {
        if self.vcpkg_debug {
            Some(BuildMode::Debug)
        } else {
            self.build_mode
        }
    }

    /// Default log filter directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mxl-env").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn about_comes_from_doc_comment() {
        let about = Cli::command().get_about().map(|about| about.to_string());
        assert_eq!(about.as_deref(), Some("MXL development environment"));
    }

    #[test]
    fn defaults_to_session() {
        let cli = parse(&[]);
        assert_eq!(cli.mode(), Mode::Session);
        assert!(cli.command.is_empty());
        assert_eq!(cli.requested_build_mode(), None);
    }

    #[test]
    fn print_env_exports_by_default() {
        assert_eq!(
            parse(&["--print-env"]).mode(),
            Mode::Print(ExportFormat::Shell { export: true })
        );
        assert_eq!(
            parse(&["--print-env", "--no-export-print-env"]).mode(),
            Mode::Print(ExportFormat::Shell { export: false })
        );
        assert_eq!(
            parse(&["--print-env", "--no-export-print-env", "--export-print-env"]).mode(),
            Mode::Print(ExportFormat::Shell { export: true })
        );
    }

    #[test]
    fn print_modes_are_exclusive() {
        let result =
            Cli::try_parse_from(["mxl-env", "--print-env", "--print-task-env"]);
        assert!(result.is_err());
    }

    #[test]
    fn trailing_command_keeps_its_flags() {
        let cli = parse(&["--vcpkg-debug", "bash", "-c", "echo $PATH"]);
        assert_eq!(cli.command, vec!["bash", "-c", "echo $PATH"]);
        assert_eq!(cli.requested_build_mode(), Some(BuildMode::Debug));
    }

    #[test]
    fn build_mode_rejects_unknown_values() {
        assert!(Cli::try_parse_from(["mxl-env", "--build-mode", "profile"]).is_err());
        assert_eq!(
            parse(&["--build-mode", "release"]).requested_build_mode(),
            Some(BuildMode::Release)
        );
    }

    #[test]
    fn static_requires_print_triplet() {
        assert!(Cli::try_parse_from(["mxl-env", "--static"]).is_err());
        assert_eq!(
            parse(&["--print-triplet", "--static"]).mode(),
            Mode::Triplet(Linkage::Static)
        );
    }

    #[test]
    fn verbosity_maps_to_level() {
        assert_eq!(parse(&[]).log_level(), "warn");
        assert_eq!(parse(&["-vv"]).log_level(), "debug");
        assert_eq!(parse(&["-q"]).log_level(), "error");
    }
}
