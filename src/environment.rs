use indexmap::IndexMap;
use std::env;

/// Separator between entries of a path-like variable.
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';

/// Ordered snapshot of a process environment.
///
/// Keys keep their first insertion position, so updating an inherited
/// variable leaves it where the parent process had it and new variables
/// are appended in the order they were derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: IndexMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid unicode cannot be
    /// represented and are skipped.
    pub fn from_process() -> Self {
        env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.shift_remove(name)
    }

    /// Drop every variable whose name starts with `prefix`, returning how many went.
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.vars.len();
        self.vars.retain(|name, _| !name.starts_with(prefix));
        before - self.vars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Put `fragment` at the head of the path-like variable `name`.
    ///
    /// A fragment that is already part of the variable is left where it is,
    /// so repeated calls are no-ops. The result never contains empty
    /// entries or leading/trailing separators.
    pub fn prepend(&mut self, name: &str, fragment: &str) {
        if fragment.is_empty() {
            return;
        }

        let current = self.get(name).unwrap_or_default();
        if current.split(PATH_SEPARATOR).any(|entry| entry == fragment) {
            return;
        }

        let separator = PATH_SEPARATOR.to_string();
        let combined = format!("{separator}{fragment}{separator}{current}");
        let collapsed = combined
            .split(PATH_SEPARATOR)
            .filter(|entry| !entry.is_empty())
            .collect::<Vec<_>>()
            .join(separator.as_str());

        self.set(name, collapsed);
    }

    /// Merge `fragments` into `name` so that they read left to right in the
    /// given order ahead of whatever the variable held before.
    pub fn prepend_all<S: AsRef<str>>(&mut self, name: &str, fragments: &[S]) {
        for fragment in fragments.iter().rev() {
            self.prepend(name, fragment.as_ref());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Environment {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

/// Directories destined for one path-like variable, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFragmentSet {
    pub name: String,
    pub fragments: Vec<String>,
}

impl PathFragmentSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fragments: Vec::new(),
        }
    }

    pub fn with<I, S>(name: impl Into<String>, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn apply(&self, env: &mut Environment) {
        env.prepend_all(&self.name, &self.fragments);
    }
}
