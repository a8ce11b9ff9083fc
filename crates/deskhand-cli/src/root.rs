use std::path::{Path, PathBuf};

use deskhand_core::paths;

/// Resolve the directory holding `deskhand.yaml` and `.env`.
///
/// Priority:
/// 1. The parent of an explicit `--config` / `DESKHAND_CONFIG` file
/// 2. Walk upward from `cwd` for a directory with either file
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit_config: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if let Some(config) = explicit_config {
        return match config.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => cwd,
        };
    }

    find_root_from(&cwd).unwrap_or(cwd)
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::is_root(dir))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_config_parent_wins() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("deskhand.yaml");
        assert_eq!(resolve_root(Some(&config)), dir.path());
    }

    #[test]
    fn bare_config_name_falls_back_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_root(Some(Path::new("deskhand.yaml"))), cwd);
    }

    #[test]
    fn finds_env_file_in_ancestor() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "OPENAI_API_KEY=x\n").unwrap();
        let deep = dir.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_root_from(&deep).as_deref(), Some(dir.path()));
    }
}
