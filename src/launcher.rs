//! Launching a shell or command inside the derived environment.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use signal_hook::consts::SIGINT;
use signal_hook::SigId;
use tempfile::NamedTempFile;

use crate::environment::Environment;
use crate::error::{Error, Result};

/// Prefix of exported bash functions; they break shells that are not bash.
pub const FUNCTION_EXPORT_PREFIX: &str = "BASH_FUNC";

pub const DEFAULT_SHELL: &str = "/bin/sh";

pub const DEFAULT_PROMPT_MARKER: &str = "[MXL DEV]";

/// Shell family of the program being launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAdapter {
    Posix,
    Bash,
    Fish,
}

impl ShellAdapter {
    /// Pick the adapter from the last path component of `program`.
    pub fn detect(program: &str) -> Self {
        let name = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if name.ends_with("fish") {
            ShellAdapter::Fish
        } else if name.ends_with("bash") {
            ShellAdapter::Bash
        } else {
            ShellAdapter::Posix
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Text put in front of the interactive prompt.
    pub prompt_marker: String,
    /// Directory holding the user's `.bashrc`.
    pub home: Option<PathBuf>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            prompt_marker: DEFAULT_PROMPT_MARKER.to_string(),
            home: None,
        }
    }
}

/// The interactive shell to start when no command is given.
pub fn interactive_shell(base: &Environment, fallback: Option<&str>) -> String {
    base.get("SHELL")
        .filter(|shell| !shell.is_empty())
        .or(fallback)
        .unwrap_or(DEFAULT_SHELL)
        .to_string()
}

/// A fully prepared child process, not yet started.
#[derive(Debug)]
pub struct Session {
    program: String,
    args: Vec<String>,
    env: Environment,
    adapter: ShellAdapter,
    startup_file: Option<NamedTempFile>,
}

impl Session {
    /// Sanitize `env` and apply the shell-specific tweaks for `argv[0]`.
    ///
    /// An empty `argv` starts the interactive shell named by `SHELL` in
    /// `env`; see [`interactive_shell`].
    pub fn prepare(mut env: Environment, argv: Vec<String>, options: &LaunchOptions) -> Result<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next().unwrap_or_else(|| interactive_shell(&env, None));
        let rest: Vec<String> = argv.collect();

        let removed = env.remove_prefixed(FUNCTION_EXPORT_PREFIX);
        if removed > 0 {
            tracing::debug!(count = removed, "Removed exported shell functions");
        }

        let adapter = ShellAdapter::detect(&program);
        tracing::debug!(%program, ?adapter, "Preparing session");

        let mut args = Vec::new();
        let mut startup_file = None;
        match adapter {
            ShellAdapter::Fish => {
                args.push("--init-command".to_string());
                args.push(fish_prompt(&options.prompt_marker));
            }
            ShellAdapter::Bash => {
                let home = options.home.clone().or_else(|| env.get("HOME").map(PathBuf::from));
                let file = bash_startup_file(home.as_deref(), &options.prompt_marker)?;
                args.push("--rcfile".to_string());
                args.push(file.path().to_string_lossy().into_owned());
                startup_file = Some(file);
            }
            ShellAdapter::Posix => {}
        }
        args.extend(rest);

        Ok(Self {
            program,
            args,
            env,
            adapter,
            startup_file,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn adapter(&self) -> ShellAdapter {
        self.adapter
    }

    pub fn startup_file(&self) -> Option<&Path> {
        self.startup_file.as_ref().map(|file| file.path())
    }

    /// Run the child with inherited stdio and wait for it.
    ///
    /// Returns the child's exit code, or `128 + signal` when it was killed.
    pub fn run(self) -> Result<i32> {
        let _interrupts = match self.adapter {
            ShellAdapter::Fish => InterruptGuard::install(),
            _ => None,
        };

        let status = Command::new(&self.program)
            .args(&self.args)
            .env_clear()
            .envs(self.env.iter())
            .status()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        tracing::debug!(%status, "Session finished");
        Ok(exit_code(status))
    }
}

/// Start `argv` inside `env` and return its exit code.
pub fn launch(env: Environment, argv: Vec<String>, options: &LaunchOptions) -> Result<i32> {
    Session::prepare(env, argv, options)?.run()
}

/// Keeps SIGINT from terminating this process while fish owns the terminal.
struct InterruptGuard {
    id: SigId,
}

impl InterruptGuard {
    fn install() -> Option<Self> {
        match signal_hook::flag::register(SIGINT, Arc::new(AtomicBool::new(false))) {
            Ok(id) => Some(Self { id }),
            Err(err) => {
                tracing::warn!(error = %err, "Could not ignore SIGINT for fish session");
                None
            }
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.id);
    }
}

fn fish_prompt(marker: &str) -> String {
    let marker = marker
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('%', "%%");
    format!(
        "function fish_prompt\n    printf '{marker} %s@%s %s%s%s > ' $USER $hostname \\\n        (set_color $fish_color_cwd) (prompt_pwd) (set_color normal)\nend"
    )
}

fn bash_prompt_line(marker: &str) -> String {
    let mut escaped = String::with_capacity(marker.len());
    for ch in marker.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("export PS1=\"{escaped} $PS1\"")
}

/// Copy of the user's `.bashrc` with the prompt marker appended.
fn bash_startup_file(home: Option<&Path>, marker: &str) -> Result<NamedTempFile> {
    let mut contents = Vec::new();
    if let Some(bashrc) = home.map(|home| home.join(".bashrc")) {
        match fs::read(&bashrc) {
            Ok(existing) => contents = existing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::StartupFile {
                    path: bashrc,
                    source,
                })
            }
        }
    }
    contents.push(b'\n');
    contents.extend_from_slice(bash_prompt_line(marker).as_bytes());
    contents.push(b'\n');

    let mut file = tempfile::Builder::new()
        .prefix("mxl-env-bashrc-")
        .tempfile()
        .map_err(|source| Error::StartupFile {
            path: std::env::temp_dir(),
            source,
        })?;
    file.write_all(&contents)
        .and_then(|()| file.flush())
        .map_err(|source| Error::StartupFile {
            path: file.path().to_path_buf(),
            source,
        })?;

    Ok(file)
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
