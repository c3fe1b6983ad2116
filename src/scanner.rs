use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A tool package directory found under an install root's `tools` folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDirectory {
    pub path: PathBuf,
    pub bin: Option<PathBuf>,
}

impl ToolDirectory {
    /// Search path candidates contributed by this tool, highest priority first.
    pub fn search_paths(&self) -> impl Iterator<Item = &Path> {
        self.bin
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.path.as_path()))
    }
}

/// List the tool directories under `<root>/tools`, sorted by name.
///
/// A missing `tools` directory yields an empty iterator; install trees
/// that have not built any tool packages yet are normal. Symlinked tool
/// directories are followed.
pub fn scan_tools(root: &Path) -> impl Iterator<Item = ToolDirectory> {
    let tools_dir = root.join("tools");

    let mut dirs: Vec<PathBuf> = match fs::read_dir(&tools_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = ?tools_dir, "No tools directory to scan");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(path = ?tools_dir, error = %err, "Cannot read tools directory, skipping");
            Vec::new()
        }
    };
    dirs.sort();

    dirs.into_iter().map(|path| {
        let bin = path.join("bin");
        ToolDirectory {
            bin: bin.is_dir().then_some(bin),
            path,
        }
    })
}
