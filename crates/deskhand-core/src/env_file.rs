//! `.env` credential file.
//!
//! The file is parsed into a map and consulted explicitly; it is never copied
//! into the process environment. Lookups prefer a variable already set in the
//! process environment, then the file.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    /// Load `path`; a missing file is an empty env.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no env file");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let env = Self::parse(&content);
        tracing::debug!(path = %path.display(), keys = env.vars.len(), "loaded env file");
        Ok(env)
    }

    /// Parse KEY=VALUE lines. Comments, blank lines and lines without `=` are
    /// skipped; an `export ` prefix and surrounding quotes are removed.
    pub fn parse(content: &str) -> Self {
        let vars = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.starts_with('#') && !l.is_empty())
            .map(|l| l.strip_prefix("export ").unwrap_or(l))
            .filter_map(|l| l.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), parse_value(v.trim())))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { vars }
    }

    /// Value from the file only.
    pub fn file_value(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Process environment first, then the file. Empty values count as unset.
    pub fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.file_value(key).filter(|v| !v.is_empty()).map(str::to_string))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.vars.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn parse_value(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return inner.replace("\\n", "\n").replace("\\\"", "\"");
    }
    if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return inner.to_string();
    }
    // Unquoted values may carry a trailing ` # comment`.
    match raw.find(" #") {
        Some(idx) => raw[..idx].trim_end().to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let env = EnvFile::parse("# comment\nFOO=bar\n\nBAZ=qux\nnot a pair\n");
        assert_eq!(env.keys(), vec!["BAZ", "FOO"]);
        assert_eq!(env.file_value("FOO"), Some("bar"));
    }

    #[test]
    fn parse_handles_export_and_quotes() {
        let env = EnvFile::parse(
            "export A=1\nB=\"two words\"\nC='single'\nD=plain # trailing\nE=\"line\\nbreak\"\n",
        );
        assert_eq!(env.file_value("A"), Some("1"));
        assert_eq!(env.file_value("B"), Some("two words"));
        assert_eq!(env.file_value("C"), Some("single"));
        assert_eq!(env.file_value("D"), Some("plain"));
        assert_eq!(env.file_value("E"), Some("line\nbreak"));
    }

    #[test]
    fn value_may_contain_equals() {
        let env = EnvFile::parse("TOKEN=abc=def==\n");
        assert_eq!(env.file_value("TOKEN"), Some("abc=def=="));
    }

    #[test]
    fn lookup_falls_back_to_file() {
        let env = EnvFile::parse("DESKHAND_TEST_ONLY_IN_FILE=from-file\nDESKHAND_TEST_EMPTY=\n");
        assert_eq!(
            env.lookup("DESKHAND_TEST_ONLY_IN_FILE").as_deref(),
            Some("from-file")
        );
        assert_eq!(env.lookup("DESKHAND_TEST_EMPTY"), None);
        assert_eq!(env.lookup("DESKHAND_TEST_NOWHERE"), None);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let env = EnvFile::load(&dir.path().join(".env")).unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OPENAI_API_KEY=sk-test\n").unwrap();
        let env = EnvFile::load(&path).unwrap();
        assert_eq!(env.file_value("OPENAI_API_KEY"), Some("sk-test"));
    }
}
