use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::session::SessionContext;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DetourConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub memory: MemoryConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Explicit context handed to the session instead of hard-coded anchor/time constants.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: String,
    pub default_anchor: String,
    pub gap_free_time_min: u32,
    pub transcript_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub enabled: bool,
    pub base_url: String,
    pub agent_id: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for DetourConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            memory: MemoryConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8737,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_detour_dir()
            .join("detour.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "detour-user".into(),
            default_anchor: "anchor_covent_garden".into(),
            gap_free_time_min: 90,
            transcript_limit: 20,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.memu.so".into(),
            agent_id: "detour-agent".into(),
            api_key_env: "MEMU_API_KEY".into(),
            timeout_secs: 15,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.anthropic.com".into(),
            model: "claude-sonnet-4-5-20250929".into(),
            max_tokens: 4096,
            api_key_env: "ANTHROPIC_API_KEY".into(),
            timeout_secs: 60,
        }
    }
}

/// Returns `~/.detour/`
pub fn default_detour_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".detour")
}

/// Returns the default config file path: `~/.detour/config.toml`
pub fn default_config_path() -> PathBuf {
    default_detour_dir().join("config.toml")
}

impl DetourConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            DetourConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (DETOUR_DB, DETOUR_LOG_LEVEL, DETOUR_USER, DETOUR_ANCHOR, DETOUR_MEMORY_URL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DETOUR_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("DETOUR_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("DETOUR_USER") {
            self.session.user_id = val;
        }
        if let Ok(val) = std::env::var("DETOUR_ANCHOR") {
            self.session.default_anchor = val;
        }
        if let Ok(val) = std::env::var("DETOUR_MEMORY_URL") {
            self.memory.base_url = val;
            self.memory.enabled = true;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Session context derived from the `[session]` section.
    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            default_anchor: self.session.default_anchor.clone(),
            gap_free_time_min: self.session.gap_free_time_min,
            user_id: self.session.user_id.clone(),
            transcript_limit: self.session.transcript_limit,
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DetourConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.session.gap_free_time_min, 90);
        assert!(!config.memory.enabled);
        assert!(!config.chat.enabled);
        assert!(config.storage.db_path.ends_with("detour.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9000

[storage]
db_path = "/tmp/test.db"

[session]
default_anchor = "anchor_soho"

[memory]
enabled = true
"#;
        let config: DetourConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.session.default_anchor, "anchor_soho");
        assert!(config.memory.enabled);
        // defaults still apply for unset fields
        assert_eq!(config.session.gap_free_time_min, 90);
        assert_eq!(config.memory.agent_id, "detour-agent");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = DetourConfig::default();
        std::env::set_var("DETOUR_DB", "/tmp/override.db");
        std::env::set_var("DETOUR_LOG_LEVEL", "trace");
        std::env::set_var("DETOUR_ANCHOR", "anchor_env");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.session.default_anchor, "anchor_env");

        // Clean up
        std::env::remove_var("DETOUR_DB");
        std::env::remove_var("DETOUR_LOG_LEVEL");
        std::env::remove_var("DETOUR_ANCHOR");
    }

    #[test]
    fn session_context_carries_session_section() {
        let config = DetourConfig::default();
        let ctx = config.session_context();
        assert_eq!(ctx.default_anchor, "anchor_covent_garden");
        assert_eq!(ctx.gap_free_time_min, 90);
        assert_eq!(ctx.user_id, "detour-user");
    }
}
