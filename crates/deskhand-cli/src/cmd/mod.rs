pub mod actions;
pub mod mcp;
pub mod run;

use anyhow::Context;
use deskhand_core::config::WarnLevel;
use deskhand_core::{paths, ActionRegistry, BackendKind, EnvFile, RelayKind, Settings};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::root;

/// Command-line values that take precedence over `deskhand.yaml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub backend: Option<BackendKind>,
    pub model: Option<String>,
    pub relay: Option<RelayKind>,
    pub max_steps: Option<u32>,
}

/// Resolved configuration for one invocation.
pub struct Workspace {
    pub config_path: PathBuf,
    pub env_path: PathBuf,
    pub settings: Settings,
    pub env: EnvFile,
}

impl Workspace {
    pub fn load(
        config: Option<&Path>,
        env_file: Option<&Path>,
        overrides: &Overrides,
    ) -> anyhow::Result<Self> {
        let root = root::resolve_root(config);
        let config_path = config
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths::config_path(&root));
        let env_path = env_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths::env_path(&root));

        let mut settings = Settings::load_file(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?;
        apply_overrides(&mut settings, overrides);

        let env = EnvFile::load(&env_path)
            .with_context(|| format!("failed to read {}", env_path.display()))?;

        for w in settings.validate() {
            match w.level {
                WarnLevel::Error => tracing::error!("config: {}", w.message),
                WarnLevel::Warning => tracing::warn!("config: {}", w.message),
            }
        }
        tracing::debug!(
            config = %config_path.display(),
            env = %env_path.display(),
            backend = settings.agent.backend.as_str(),
            "workspace loaded"
        );

        Ok(Self {
            config_path,
            env_path,
            settings,
            env,
        })
    }

    /// The standard action catalog over the configured interpreter.
    pub fn registry(&self) -> ActionRegistry {
        let scripting = &self.settings.scripting;
        ActionRegistry::standard(Arc::new(scripting.interpreter())).with_limit(scripting.result_limit)
    }

    /// Arguments that start `deskhand mcp` against this same configuration.
    pub fn mcp_args(&self) -> Vec<String> {
        vec![
            "--config".to_string(),
            absolute(&self.config_path).display().to_string(),
            "--env-file".to_string(),
            absolute(&self.env_path).display().to_string(),
            "mcp".to_string(),
        ]
    }
}

fn apply_overrides(settings: &mut Settings, o: &Overrides) {
    if let Some(backend) = o.backend {
        if backend != settings.agent.backend {
            // A model and key variable chosen for the old backend would not fit the new one.
            settings.agent.model = None;
            settings.agent.api_key_env = None;
        }
        settings.agent.backend = backend;
    }
    if let Some(model) = &o.model {
        settings.agent.model = Some(model.clone());
    }
    if let Some(relay) = o.relay {
        settings.relay = relay;
    }
    if let Some(max_steps) = o.max_steps {
        settings.agent.max_steps = max_steps;
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
