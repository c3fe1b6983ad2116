use super::Settings;
use crate::config;
use crate::launcher::{interactive_shell, launch, LaunchOptions};
use anyhow::Result;
use std::path::PathBuf;

pub fn execute(settings: &Settings, command: Vec<String>) -> Result<i32> {
    let (base, derived) = settings.environments()?;

    let argv = if command.is_empty() {
        vec![interactive_shell(&base, settings.default_shell.as_deref())]
    } else {
        command
    };

    let options = LaunchOptions {
        prompt_marker: settings.prompt_marker.clone(),
        home: base
            .get("HOME")
            .map(PathBuf::from)
            .or_else(config::home_dir),
    };

    let code = launch(derived, argv, &options)?;
    tracing::debug!(code, "Session exited");
    Ok(code)
}
