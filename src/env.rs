// src/env.rs

//! Immutable environment variable sets
//!
//! An [`Env`] is a value type: every mutator borrows the receiver and returns
//! a fresh copy, so an environment handed to one recipe can never be changed
//! behind its back by another.
//!
//! # Example
//!
//! ```
//! use sbuild::env::Env;
//!
//! let base = Env::empty().set("CFLAGS", "-O2");
//! let static_env = base.append("CFLAGS", " -static ");
//!
//! assert_eq!(base.get("CFLAGS"), "-O2");
//! assert_eq!(static_env.get("CFLAGS"), "-O2 -static ");
//! ```

use std::collections::BTreeMap;

/// A set of environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: BTreeMap<String, String>,
}

impl Env {
    /// Create an environment seeded from this process's environment
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_os() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Create an empty environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of variables set
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are set
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Get the value of a variable, or the empty string if it is unset
    pub fn get(&self, key: &str) -> &str {
        self.vars.get(key).map(String::as_str).unwrap_or("")
    }

    /// Get the value of a variable, distinguishing "unset" from "set to empty"
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set a variable. Returns a new copy.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut vars = self.vars.clone();
        vars.insert(key.into(), value.into());
        Self { vars }
    }

    /// Append to a variable's current value (empty if unset). Returns a new copy.
    pub fn append(&self, key: impl Into<String>, value: &str) -> Self {
        let mut vars = self.vars.clone();
        vars.entry(key.into()).or_default().push_str(value);
        Self { vars }
    }

    /// Remove a variable. Returns a new copy.
    pub fn delete(&self, key: &str) -> Self {
        let mut vars = self.vars.clone();
        vars.remove(key);
        Self { vars }
    }

    /// Merge `other` on top of this environment. Returns a new copy.
    ///
    /// On a key conflict the value from `other` wins.
    pub fn merge(&self, other: &Env) -> Self {
        let mut vars = self.vars.clone();
        for (k, v) in &other.vars {
            vars.insert(k.clone(), v.clone());
        }
        Self { vars }
    }

    /// Merge `other` on top of this environment. Returns a new copy.
    ///
    /// On a key conflict the value from `other` is appended to ours.
    pub fn merge_append(&self, other: &Env) -> Self {
        let mut vars = self.vars.clone();
        for (k, v) in &other.vars {
            vars.entry(k.clone()).or_default().push_str(v);
        }
        Self { vars }
    }

    /// Render as `KEY=VALUE` strings
    ///
    /// Callers must not rely on the order of the returned entries.
    pub fn as_vec(&self) -> Vec<String> {
        self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// Iterate over `(key, value)` pairs, e.g. for `Command::envs`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(env: &Env) -> Vec<String> {
        let mut vars = env.as_vec();
        vars.sort();
        vars
    }

    #[test]
    fn test_constructors() {
        let os = Env::from_os();
        assert_eq!(os.len(), std::env::vars().count());

        assert_eq!(Env::empty().len(), 0);
    }

    #[test]
    fn test_get_set() {
        let env = Env::empty().set("one", "1").set("two", "2");

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("two"), "2");
        assert_eq!(env.lookup("two"), Some("2"));
        assert_eq!(env.lookup("nonexisting"), None);
        assert_eq!(env.get("nonexisting"), "");
        assert_eq!(sorted(&env), vec!["one=1", "two=2"]);
    }

    #[test]
    fn test_lookup_distinguishes_empty() {
        let env = Env::empty().set("EMPTY", "");
        assert_eq!(env.lookup("EMPTY"), Some(""));
        assert_eq!(env.get("EMPTY"), env.get("MISSING"));
        assert_eq!(env.lookup("MISSING"), None);
    }

    #[test]
    fn test_delete() {
        let env = Env::empty().set("one", "1");
        assert_eq!(env.as_vec(), vec!["one=1"]);

        let env = env.delete("one");
        assert!(env.as_vec().is_empty());
    }

    #[test]
    fn test_append() {
        let env = Env::empty().set("one", "1").append("one", " 1");
        assert_eq!(env.get("one"), "1 1");
    }

    #[test]
    fn test_append_absent_key() {
        let env = Env::empty().append("one", "1");
        assert_eq!(env.as_vec(), vec!["one=1"]);
    }

    #[test]
    fn test_merge() {
        let first = Env::empty().append("key", " foo ");
        let second = Env::empty().append("key", " bar ");

        assert_eq!(first.merge(&second).get("key"), " bar ");
    }

    #[test]
    fn test_merge_append() {
        let first = Env::empty().append("key", " foo ");
        let second = Env::empty().append("key", " bar ").set("other", "x");

        let merged = first.merge_append(&second);
        assert_eq!(merged.get("key"), " foo  bar ");
        assert_eq!(merged.get("other"), "x");
    }

    #[test]
    fn test_mutators_leave_receiver_unchanged() {
        let env = Env::empty().set("CC", "gcc").set("CFLAGS", "-O2");
        let other = Env::empty().set("CC", "clang");
        let before = env.clone();

        let _ = env.set("CC", "musl-gcc");
        let _ = env.append("CFLAGS", " -static");
        let _ = env.delete("CC");
        let _ = env.merge(&other);
        let _ = env.merge_append(&other);

        assert_eq!(env, before);
        assert_eq!(env.get("CC"), "gcc");
        assert_eq!(env.get("CFLAGS"), "-O2");
    }

    #[test]
    fn test_from_iterator() {
        let env: Env = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.get("A"), "1");
        assert_eq!(env.iter().count(), 2);
    }
}
