//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".quickpick/config.toml";

/// Placeholder in `exec_command` replaced with the search text.
pub const SEARCH_PLACEHOLDER: &str = "${search}";

/// Read-only view of the settings the quick-open controller consults.
///
/// Every call returns an owned snapshot; callers never mutate configuration storage.
pub trait ConfigSource {
    /// Override listing command template, if configured.
    fn exec_command(&self) -> Option<String>;
    /// Configured bookmark paths in their configured order.
    fn bookmarks(&self) -> Vec<String>;
    /// Whether hidden files are listed by the native walker.
    fn show_hidden(&self) -> bool {
        false
    }
}

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub quick_open: QuickOpenSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuickOpenSettings {
    #[serde(default)]
    pub exec_command: Option<String>,
    #[serde(default)]
    pub bookmarks: Vec<String>,
    #[serde(default)]
    pub show_hidden: bool,
}

impl QuickOpenSettings {
    /// The override command, treating an empty string as unset.
    pub fn exec_command(&self) -> Option<&str> {
        self.exec_command
            .as_deref()
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty())
    }
}

impl ConfigSource for Config {
    fn exec_command(&self) -> Option<String> {
        self.quick_open.exec_command().map(str::to_owned)
    }

    fn bookmarks(&self) -> Vec<String> {
        self.quick_open.bookmarks.clone()
    }

    fn show_hidden(&self) -> bool {
        self.quick_open.show_hidden
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    exec_command: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            exec_command: env::var("QUICKPICK_EXEC_COMMAND").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(exec_command: &str) -> Self {
        Self {
            exec_command: Some(exec_command.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    /// Serialize the effective configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }

    fn merge(self, other: Self) -> Self {
        Self {
            quick_open: merge_quick_open(self.quick_open, other.quick_open),
        }
    }
}

fn merge_quick_open(
    base: QuickOpenSettings,
    overlay: QuickOpenSettings,
) -> QuickOpenSettings {
    let exec_command = if overlay.exec_command().is_some() {
        overlay.exec_command
    } else {
        base.exec_command
    };
    // Bookmark order is meaningful, so a non-empty layer replaces rather than unions.
    let bookmarks = if overlay.bookmarks.is_empty() {
        base.bookmarks
    } else {
        overlay.bookmarks
    };

    QuickOpenSettings {
        exec_command,
        bookmarks,
        show_hidden: overlay.show_hidden || base.show_hidden,
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("quickpick/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(exec_command) = env.exec_command {
        config.quick_open.exec_command = Some(exec_command);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.exec_command(), None);
        assert!(config.bookmarks().is_empty());
        assert!(!config.show_hidden());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[quick_open]
exec_command = "rg --files ${search}"
bookmarks = ["~/notes", "~/src/"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".quickpick"))?;
        fs::write(
            workspace_dir.join(".quickpick/config.toml"),
            r#"
[quick_open]
exec_command = ""
show_hidden = true
"#,
        )?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".quickpick/config.toml")),
            EnvOverrides::default(),
        )?;

        assert_eq!(config.exec_command().as_deref(), Some("rg --files ${search}"));
        assert_eq!(config.bookmarks(), vec!["~/notes", "~/src/"]);
        assert!(config.show_hidden());
        Ok(())
    }

    #[test]
    fn later_bookmarks_replace_earlier_ones_in_order() {
        let base = QuickOpenSettings {
            bookmarks: vec!["a".into(), "b".into()],
            ..QuickOpenSettings::default()
        };
        let overlay = QuickOpenSettings {
            bookmarks: vec!["z".into(), "a".into()],
            ..QuickOpenSettings::default()
        };
        assert_eq!(merge_quick_open(base, overlay).bookmarks, vec!["z", "a"]);
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("fd --type f");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.exec_command().as_deref(), Some("fd --type f"));
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }
}
