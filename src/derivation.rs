//! Derivation of the MXL development environment from an inherited one.
//!
//! The derived environment starts as a copy of the base and only ever grows:
//! bookkeeping variables describing the vcpkg install tree, the GStreamer and
//! pkg-config search paths, and the tool directories on `PATH`.

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use crate::environment::{Environment, PathFragmentSet};
use crate::error::Result;
use crate::scanner::scan_tools;
use crate::triplet::Triplet;

/// Names of the variables this tool sets. Downstream tooling matches on them.
pub mod vars {
    pub const PATH: &str = "PATH";
    pub const SYSTEM_DEFAULT_PATH: &str = "SYSTEM_DEFAULT_PATH";

    pub const VCPKG_INSTALL_PATH: &str = "VCPKG_INSTALL_PATH";
    pub const VCPKG_INSTALL_LIB_PATH: &str = "VCPKG_INSTALL_LIB_PATH";
    pub const VCPKG_INSTALL_PLUGINS_PATH: &str = "VCPKG_INSTALL_PLUGINS_PATH";
    pub const MXL_VCPKG_TRIPLET: &str = "MXL_VCPKG_TRIPLET";

    pub const PKG_CONFIG_PATH: &str = "PKG_CONFIG_PATH";
    pub const GST_PLUGIN_PATH: &str = "GST_PLUGIN_PATH_1_0";
    pub const GST_PRESET_PATH: &str = "GST_PRESET_PATH";
    pub const GST_ENCODING_TARGET_PATH: &str = "GST_ENCODING_TARGET_PATH";
    pub const GST_PLUGIN_SYSTEM_PATH: &str = "GST_PLUGIN_SYSTEM_PATH_1_0";
    pub const GSETTINGS_SCHEMA_DIR: &str = "GSETTINGS_SCHEMA_DIR";
    pub const GST_PLUGIN_SCANNER: &str = "GST_PLUGIN_SCANNER";
    pub const GDK_PIXBUF_MODULE_FILE: &str = "GDK_PIXBUF_MODULE_FILE";
}

const SYSTEM_GSTREAMER_PLUGIN_DIRS: &[&str] = &[
    "/usr/lib/gstreamer-1.0",
    "/usr/lib64/gstreamer-1.0",
    "/usr/local/lib/gstreamer-1.0",
    "/usr/local/lib64/gstreamer-1.0",
];

/// Which flavour of the vcpkg libraries to put on the search paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Debug,
    #[default]
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeriveOptions {
    pub triplet: Triplet,
    pub build_mode: BuildMode,
}

impl DeriveOptions {
    /// Options for the running host; fails on hosts without a triplet.
    pub fn for_host(build_mode: BuildMode) -> Result<Self> {
        Ok(Self {
            triplet: Triplet::host()?,
            build_mode,
        })
    }
}

/// Optional query for the gdk-pixbuf loader ABI version.
pub trait PixbufProbe {
    /// Returns `None` when the version cannot be determined.
    fn binary_version(&self, env: &Environment) -> Option<String>;
}

/// Asks `pkg-config` inside the derived environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PkgConfigProbe;

impl PixbufProbe for PkgConfigProbe {
    fn binary_version(&self, env: &Environment) -> Option<String> {
        let output = Command::new("pkg-config")
            .args(["gdk-pixbuf-2.0", "--variable=gdk_pixbuf_binary_version"])
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(error = %err, "pkg-config is not available");
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!(status = %output.status, "gdk-pixbuf-2.0 is not known to pkg-config");
            return None;
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!version.is_empty()).then_some(version)
    }
}

/// Build the development environment on top of `base`.
///
/// When `<install_root>/<triplet>` does not exist yet the base environment
/// is returned untouched.
pub fn derive(
    base: &Environment,
    install_root: &Path,
    options: &DeriveOptions,
    probe: &dyn PixbufProbe,
) -> Environment {
    let mut env = base.clone();

    let install_path = install_root.join(options.triplet.dynamic());
    if !install_path.is_dir() {
        tracing::debug!(path = ?install_path, "No vcpkg install tree, leaving environment untouched");
        return env;
    }

    let (lib_path, plugins_path) = match options.build_mode {
        BuildMode::Debug => (
            install_path.join("debug").join("lib"),
            install_path.join("debug").join("plugins"),
        ),
        BuildMode::Release => (install_path.join("lib"), install_path.join("plugins")),
    };
    tracing::debug!(path = ?install_path, mode = ?options.build_mode, "Deriving environment");

    if let Some(path) = base.get(vars::PATH) {
        env.set(vars::SYSTEM_DEFAULT_PATH, path);
    }

    env.set(vars::VCPKG_INSTALL_PATH, display(&install_path));
    env.set(vars::VCPKG_INSTALL_LIB_PATH, display(&lib_path));
    env.set(vars::VCPKG_INSTALL_PLUGINS_PATH, display(&plugins_path));
    env.set(vars::MXL_VCPKG_TRIPLET, options.triplet.dynamic());

    let share = install_path.join("share");
    env.set(
        vars::GSETTINGS_SCHEMA_DIR,
        normalize(&share.join("glib-2.0").join("schemas")),
    );
    env.set(
        vars::GST_PLUGIN_SCANNER,
        normalize(&install_path.join("tools/gstreamer/gst-plugin-scanner")),
    );

    for set in search_paths(&install_path, &lib_path, &plugins_path) {
        set.apply(&mut env);
    }

    let mut tool_paths = PathFragmentSet::new(vars::PATH);
    for root in [
        install_root.join(options.triplet.static_tag()),
        install_path.clone(),
    ] {
        for tool in scan_tools(&root) {
            tracing::trace!(tool = ?tool.path, "Adding tool to PATH");
            for path in tool.search_paths() {
                tool_paths.push(display(path));
            }
        }
    }
    tool_paths.apply(&mut env);

    if let Some(version) = probe.binary_version(&env) {
        tracing::debug!(%version, "Found gdk-pixbuf loader version");
        let cache = install_path
            .join("lib")
            .join("gdk-pixbuf-2.0")
            .join(&version)
            .join("loaders.cache");
        env.set(vars::GDK_PIXBUF_MODULE_FILE, normalize(&cache));
    }

    env
}

/// The well-known search path variables, in the order they are applied.
fn search_paths(install: &Path, lib: &Path, plugins: &Path) -> Vec<PathFragmentSet> {
    let gstreamer_share = install.join("share").join("gstreamer-1.0");
    vec![
        PathFragmentSet::with(vars::PKG_CONFIG_PATH, [display(&lib.join("pkgconfig"))]),
        PathFragmentSet::with(
            vars::GST_PLUGIN_PATH,
            [
                display(&plugins.join("gstreamer")),
                display(&lib.join("gstreamer-1.0")),
            ],
        ),
        PathFragmentSet::with(
            vars::GST_PRESET_PATH,
            [display(&gstreamer_share.join("presets"))],
        ),
        PathFragmentSet::with(
            vars::GST_ENCODING_TARGET_PATH,
            [display(&gstreamer_share.join("encoding-profiles"))],
        ),
        PathFragmentSet::with(
            vars::GST_PLUGIN_SYSTEM_PATH,
            SYSTEM_GSTREAMER_PLUGIN_DIRS.iter().copied(),
        ),
    ]
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Lexically clean a path: drop `.` components, fold `..` into its parent
/// and collapse repeated separators. The filesystem is not consulted.
fn normalize(path: &Path) -> String {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(clean.components().next_back(), Some(Component::Normal(_))) {
                    clean.pop();
                } else if !clean.has_root() {
                    clean.push("..");
                }
            }
            other => clean.push(other.as_os_str()),
        }
    }

    if clean.as_os_str().is_empty() {
        ".".to_string()
    } else {
        display(&clean)
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedProbe(Option<&'static str>);

    impl PixbufProbe for FixedProbe {
        fn binary_version(&self, _env: &Environment) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn options(build_mode: BuildMode) -> DeriveOptions {
        DeriveOptions {
            triplet: Triplet::X64Linux,
            build_mode,
        }
    }

    fn base() -> Environment {
        [("PATH", "/usr/bin"), ("HOME", "/home/dev")]
            .into_iter()
            .collect()
    }

    fn install_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("x64-linux-dynamic")).unwrap();
        temp
    }

    #[test]
    fn missing_install_tree_passes_base_through() {
        let temp = TempDir::new().unwrap();
        let derived = derive(
            &base(),
            temp.path(),
            &options(BuildMode::Release),
            &FixedProbe(Some("2.10.0")),
        );
        assert_eq!(derived, base());
    }

    #[test]
    fn sets_bookkeeping_variables() {
        let temp = install_tree();
        let install = temp.path().join("x64-linux-dynamic");
        let derived = derive(&base(), temp.path(), &options(BuildMode::Release), &FixedProbe(None));

        assert_eq!(derived.get(vars::SYSTEM_DEFAULT_PATH), Some("/usr/bin"));
        assert_eq!(derived.get(vars::VCPKG_INSTALL_PATH), Some(display(&install).as_str()));
        assert_eq!(
            derived.get(vars::VCPKG_INSTALL_LIB_PATH),
            Some(display(&install.join("lib")).as_str())
        );
        assert_eq!(
            derived.get(vars::VCPKG_INSTALL_PLUGINS_PATH),
            Some(display(&install.join("plugins")).as_str())
        );
        assert_eq!(derived.get(vars::MXL_VCPKG_TRIPLET), Some("x64-linux-dynamic"));
        assert_eq!(
            derived.get(vars::GST_PLUGIN_SCANNER),
            Some(display(&install.join("tools/gstreamer/gst-plugin-scanner")).as_str())
        );
    }

    #[test]
    fn debug_mode_uses_debug_subtree() {
        let temp = install_tree();
        let install = temp.path().join("x64-linux-dynamic");
        let derived = derive(&base(), temp.path(), &options(BuildMode::Debug), &FixedProbe(None));

        let lib = install.join("debug/lib");
        assert_eq!(derived.get(vars::VCPKG_INSTALL_LIB_PATH), Some(display(&lib).as_str()));
        assert_eq!(
            derived.get(vars::PKG_CONFIG_PATH),
            Some(display(&lib.join("pkgconfig")).as_str())
        );
        let expected_plugins = format!(
            "{}:{}",
            display(&install.join("debug/plugins/gstreamer")),
            display(&lib.join("gstreamer-1.0"))
        );
        assert_eq!(derived.get(vars::GST_PLUGIN_PATH), Some(expected_plugins.as_str()));
    }

    #[test]
    fn search_paths_keep_existing_entries_last() {
        let temp = install_tree();
        let mut base = base();
        base.set(vars::GST_PLUGIN_SYSTEM_PATH, "/opt/gst");
        let derived = derive(&base, temp.path(), &options(BuildMode::Release), &FixedProbe(None));

        assert_eq!(
            derived.get(vars::GST_PLUGIN_SYSTEM_PATH),
            Some(
                "/usr/lib/gstreamer-1.0:/usr/lib64/gstreamer-1.0:\
                 /usr/local/lib/gstreamer-1.0:/usr/local/lib64/gstreamer-1.0:/opt/gst"
            )
        );
    }

    #[test]
    fn tool_bin_directory_precedes_tool_directory() {
        let temp = install_tree();
        let foo = temp.path().join("x64-linux-dynamic/tools/foo");
        fs::create_dir_all(foo.join("bin")).unwrap();

        let derived = derive(&base(), temp.path(), &options(BuildMode::Release), &FixedProbe(None));
        let expected = format!("{}:{}:/usr/bin", display(&foo.join("bin")), display(&foo));
        assert_eq!(derived.get(vars::PATH), Some(expected.as_str()));
    }

    #[test]
    fn static_tools_take_priority_over_dynamic_tools() {
        let temp = install_tree();
        let static_tool = temp.path().join("x64-linux/tools/pkgconf");
        let dynamic_tool = temp.path().join("x64-linux-dynamic/tools/gstreamer");
        fs::create_dir_all(&static_tool).unwrap();
        fs::create_dir_all(&dynamic_tool).unwrap();

        let derived = derive(&base(), temp.path(), &options(BuildMode::Release), &FixedProbe(None));
        let expected = format!("{}:{}:/usr/bin", display(&static_tool), display(&dynamic_tool));
        assert_eq!(derived.get(vars::PATH), Some(expected.as_str()));
        assert_eq!(derived.get(vars::SYSTEM_DEFAULT_PATH), Some("/usr/bin"));
    }

    #[test]
    fn probe_result_sets_loader_cache() {
        let temp = install_tree();
        let install = temp.path().join("x64-linux-dynamic");

        let derived = derive(
            &base(),
            temp.path(),
            &options(BuildMode::Debug),
            &FixedProbe(Some("2.10.0")),
        );
        let expected = install.join("lib/gdk-pixbuf-2.0/2.10.0/loaders.cache");
        assert_eq!(
            derived.get(vars::GDK_PIXBUF_MODULE_FILE),
            Some(display(&expected).as_str())
        );

        let without = derive(&base(), temp.path(), &options(BuildMode::Debug), &FixedProbe(None));
        assert!(!without.contains(vars::GDK_PIXBUF_MODULE_FILE));
    }

    #[test]
    fn derivation_is_deterministic() {
        let temp = install_tree();
        fs::create_dir_all(temp.path().join("x64-linux-dynamic/tools/b/bin")).unwrap();
        fs::create_dir_all(temp.path().join("x64-linux-dynamic/tools/a")).unwrap();

        let first = derive(&base(), temp.path(), &options(BuildMode::Release), &FixedProbe(None));
        let second = derive(&base(), temp.path(), &options(BuildMode::Release), &FixedProbe(None));
        assert_eq!(first, second);
    }

    #[test]
    fn rederiving_from_derived_environment_is_stable() {
        let temp = install_tree();
        fs::create_dir_all(temp.path().join("x64-linux-dynamic/tools/foo/bin")).unwrap();

        let opts = options(BuildMode::Release);
        let once = derive(&base(), temp.path(), &opts, &FixedProbe(None));
        let twice = derive(&once, temp.path(), &opts, &FixedProbe(None));
        assert_eq!(once.get(vars::PATH), twice.get(vars::PATH));
        assert_eq!(once.get(vars::PKG_CONFIG_PATH), twice.get(vars::PKG_CONFIG_PATH));
    }

    #[test]
    fn normalize_folds_dot_components() {
        assert_eq!(normalize(Path::new("/a/./b//c/../d")), "/a/b/d");
        assert_eq!(normalize(Path::new("/../a")), "/a");
        assert_eq!(normalize(Path::new("a/../../b")), "../b");
        assert_eq!(normalize(Path::new("./")), ".");
    }
}
