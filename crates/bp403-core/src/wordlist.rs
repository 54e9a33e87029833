//! Wordlist loader interface. Filesystem I/O of wordlist files is out
//! of scope for the core; the core only consumes an already-resolved,
//! ordered list of strings through this trait boundary, so generators
//! can be tested without touching disk.

use crate::error::{utils::wordlist_unavailable, BypassError};

/// External collaborator boundary: given a wordlist name, produce its
/// lines stripped of surrounding whitespace with empty lines skipped.
/// Implementations that read from disk, embed a default list, or fetch
/// a bundled payload file all satisfy this trait identically.
pub trait WordlistSource {
    fn load(&self, name: &str, max_lines: Option<usize>) -> Result<Vec<String>, BypassError>;
}

/// Test/offline double: an in-memory map of name -> lines, used by the
/// generator unit tests and any caller that has already materialized its
/// wordlists (e.g. from a CLI-parsed file).
#[derive(Debug, Clone, Default)]
pub struct InMemoryWordlist {
    lists: std::collections::HashMap<String, Vec<String>>,
}

impl InMemoryWordlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, lines: Vec<&str>) -> Self {
        self.lists.insert(name.into(), lines.into_iter().map(String::from).collect());
        self
    }
}

impl WordlistSource for InMemoryWordlist {
    fn load(&self, name: &str, max_lines: Option<usize>) -> Result<Vec<String>, BypassError> {
        let lines = self
            .lists
            .get(name)
            .ok_or_else(|| wordlist_unavailable(name, "no such wordlist registered"))?;
        let cleaned: Vec<String> = lines
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(match max_lines {
            Some(n) => cleaned.into_iter().take(n).collect(),
            None => cleaned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_skips_empty_lines() {
        let wl = InMemoryWordlist::new().with("mid", vec!["  ..;/  ", "", "%2e%2e/", "   "]);
        let lines = wl.load("mid", None).unwrap();
        assert_eq!(lines, vec!["..;/".to_string(), "%2e%2e/".to_string()]);
    }

    #[test]
    fn missing_wordlist_is_unavailable_error() {
        let wl = InMemoryWordlist::new();
        assert!(wl.load("nope", None).is_err());
    }

    #[test]
    fn respects_max_lines() {
        let wl = InMemoryWordlist::new().with("m", vec!["a", "b", "c"]);
        let lines = wl.load("m", Some(2)).unwrap();
        assert_eq!(lines, vec!["a".to_string(), "b".to_string()]);
    }
}
