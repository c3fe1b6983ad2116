//! Rendering of the variables a derived environment adds or changes.
//!
//! Only the delta against the inherited environment is ever printed, so
//! nothing the parent process already had leaks into the output.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::environment::Environment;

/// Settings key rust-analyzer reads extra cargo environment from.
pub const RUST_ANALYZER_ENV_KEY: &str = "rust-analyzer.cargo.extraEnv";

/// Variables present in the derived environment but absent or different in the base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDelta {
    entries: Vec<(String, String)>,
}

impl EnvironmentDelta {
    /// Compare two snapshots; entries follow the derived environment's order.
    pub fn between(base: &Environment, derived: &Environment) -> Self {
        let entries = derived
            .iter()
            .filter(|(name, value)| base.get(name) != Some(*value))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names mapped to shell-quoted values, in delta order.
    fn quoted_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), Value::String(shell_quote(value))))
            .collect()
    }
}

/// Output encodings for a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `NAME=value` lines, optionally followed by `export NAME`.
    Shell { export: bool },
    /// rust-analyzer `extraEnv` settings fragment.
    RustAnalyzer,
    /// VS Code `tasks.json` with a cargo build task.
    Task,
}

pub fn render(delta: &EnvironmentDelta, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Shell { export } => Ok(render_shell(delta, export)),
        ExportFormat::RustAnalyzer => render_rust_analyzer(delta),
        ExportFormat::Task => render_task(delta),
    }
}

fn render_shell(delta: &EnvironmentDelta, export: bool) -> String {
    let mut out = String::new();
    for (name, value) in delta.iter() {
        out.push_str(&format!("{name}={}\n", shell_quote(value)));
        if export {
            out.push_str(&format!("export {name}\n"));
        }
    }
    out
}

fn render_rust_analyzer(delta: &EnvironmentDelta) -> Result<String> {
    let body = to_pretty(&delta.quoted_map(), b"    ")?;
    let mut lines = body.lines();

    let mut out = format!(
        "    {}: {}\n",
        serde_json::to_string(RUST_ANALYZER_ENV_KEY)?,
        lines.next().unwrap_or("{}")
    );
    for line in lines {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

fn render_task(delta: &EnvironmentDelta) -> Result<String> {
    let document = json!({
        "version": "2.0.0",
        "tasks": [
            {
                "type": "cargo",
                "command": "build",
                "args": ["--features=......."],
                "problemMatcher": ["$rustc"],
                "group": "build",
                "label": "rust: cargo build",
                "env": delta.quoted_map(),
            }
        ]
    });

    let mut out = to_pretty(&document, b"\t")?;
    out.push('\n');
    Ok(out)
}

fn to_pretty<T: Serialize>(value: &T, indent: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize environment")?;
    String::from_utf8(buf).context("Serialized environment is not UTF-8")
}

/// Quote a value for a POSIX shell.
///
/// Values made only of characters the shell never interprets are left as
/// they are; everything else is single-quoted.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}
