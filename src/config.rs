use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::panel::ViewMode;

const DEFAULT_ENV_PREFIX: &str = "VIDTREE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_user_agent() -> String {
    format!("vidtree/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UIConfig {
    #[serde(default)]
    pub default_view: ViewMode,
    #[serde(default)]
    pub related_view: ViewMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayTarget {
    #[default]
    Browser,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    #[serde(default)]
    pub open_with: PlayTarget,
    #[serde(default = "default_player_command")]
    pub command: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            open_with: PlayTarget::default(),
            command: default_player_command(),
        }
    }
}

fn default_player_command() -> Vec<String> {
    vec!["mpv".into(), "%URL%".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_log_dir")]
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            directory: default_log_dir(),
        }
    }
}

fn default_log_filter() -> String {
    "info".into()
}

fn default_log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("vidtree").join("logs"))
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            cfg = read_config_file(path)?;
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            cfg = read_config_file(&default_path)?;
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);
    normalize(&mut cfg);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn normalize(cfg: &mut Config) {
    if cfg.server.base_url.trim().is_empty() {
        cfg.server.base_url = default_base_url();
    }
    if cfg.server.user_agent.trim().is_empty() {
        cfg.server.user_agent = default_user_agent();
    }
    if cfg.player.command.is_empty() {
        cfg.player.command = default_player_command();
    }
    if cfg.log.filter.trim().is_empty() {
        cfg.log.filter = default_log_filter();
    }
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            apply_env_value(cfg, &normalized, value);
        }
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "server.base_url" => cfg.server.base_url = value,
        "server.user_agent" => cfg.server.user_agent = value,
        "server.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.server.timeout = duration;
            }
        }
        "ui.default_view" => {
            if let Some(mode) = ViewMode::parse(&value) {
                cfg.ui.default_view = mode;
            }
        }
        "ui.related_view" => {
            if let Some(mode) = ViewMode::parse(&value) {
                cfg.ui.related_view = mode;
            }
        }
        "player.open_with" => match value.trim().to_ascii_lowercase().as_str() {
            "browser" => cfg.player.open_with = PlayTarget::Browser,
            "command" => cfg.player.open_with = PlayTarget::Command,
            _ => {}
        },
        "player.command" => {
            cfg.player.command = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "log.filter" => cfg.log.filter = value,
        "log.directory" => cfg.log.directory = Some(PathBuf::from(value)),
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vidtree").join("config.yaml"))
}
