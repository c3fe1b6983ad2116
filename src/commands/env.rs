use super::Settings;
use crate::export::{render, EnvironmentDelta, ExportFormat};
use anyhow::Result;
use std::io::{self, Write};

pub fn execute(settings: &Settings, format: ExportFormat) -> Result<i32> {
    let (base, derived) = settings.environments()?;
    let delta = EnvironmentDelta::between(&base, &derived);
    tracing::debug!(count = delta.len(), ?format, "Printing environment delta");

    let mut stdout = io::stdout().lock();
    stdout.write_all(render(&delta, format)?.as_bytes())?;
    stdout.flush()?;

    Ok(0)
}
