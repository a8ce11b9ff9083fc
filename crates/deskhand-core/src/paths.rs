use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "deskhand.yaml";
pub const ENV_FILE: &str = ".env";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn env_path(root: &Path) -> PathBuf {
    root.join(ENV_FILE)
}

/// True if `dir` holds a config file or an env file.
pub fn is_root(dir: &Path) -> bool {
    config_path(dir).is_file() || env_path(dir).is_file()
}
