//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.lexi/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LexiConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub auth0: Auth0Config,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ClientConfig {
    pub api_url: Option<String>,
    pub offline: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Auth0Config {
    pub domain: Option<String>,
    pub client_id: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub backend_url: Option<String>,
    pub placeholder_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_BACKEND_URL: &str = "https://polish-law-backend.onrender.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_PLACEHOLDER_DELAY_MS: u64 = 500;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful legal assistant specializing in Polish law for foreigners.";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub offline: bool,
    pub access_token: Option<String>,
    pub auth0_domain: Option<String>,
    pub auth0_client_id: Option<String>,
    pub auth0_audience: Option<String>,
    pub bind: String,
    pub backend_url: String,
    pub placeholder_delay_ms: u64,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub system_prompt: String,
}

/// Values given on the command line. `None` / `false` = not specified.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub offline: bool,
    pub bind: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.lexi/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lexi").join("config.toml"))
}

/// Load config from `~/.lexi/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LexiConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<LexiConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(LexiConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(LexiConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: LexiConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Lexi Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [client]
# api_url = "http://localhost:8000"      # Or LEXI_API_URL
# offline = false                        # Answer locally, no network

# [auth0]
# domain = "your-tenant.eu.auth0.com"    # Or AUTH0_DOMAIN
# client_id = "..."                      # Or AUTH0_CLIENT_ID
# audience = "https://polish-law-api"    # Or AUTH0_AUDIENCE

# [server]
# bind = "127.0.0.1:8000"                # Or LEXI_BIND
# backend_url = "https://polish-law-backend.onrender.com"   # Or BACKEND_URL
# placeholder_delay_ms = 500

# [openai]
# api_key = "sk-..."                     # Or OPENAI_API_KEY
# base_url = "https://api.openai.com/v1"
# model = "gpt-4o"
# system_prompt = "You are a helpful legal assistant specializing in Polish law for foreigners."
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &LexiConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an explicit environment lookup.
/// Empty variables count as unset.
pub fn resolve_with<F>(config: &LexiConfig, cli: &CliOverrides, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    // API URL: CLI → env → config → default
    let api_url = cli
        .api_url
        .clone()
        .or_else(|| env("LEXI_API_URL"))
        .or_else(|| config.client.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let offline = cli.offline || config.client.offline.unwrap_or(false);

    let bind = cli
        .bind
        .clone()
        .or_else(|| env("LEXI_BIND"))
        .or_else(|| config.server.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let backend_url = env("BACKEND_URL")
        .or_else(|| config.server.backend_url.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    let placeholder_delay_ms = env("LEXI_PLACEHOLDER_DELAY_MS")
        .and_then(|v| v.parse().ok())
        .or(config.server.placeholder_delay_ms)
        .unwrap_or(DEFAULT_PLACEHOLDER_DELAY_MS);

    ResolvedConfig {
        api_url,
        offline,
        access_token: env("LEXI_ACCESS_TOKEN"),
        auth0_domain: env("AUTH0_DOMAIN").or_else(|| config.auth0.domain.clone()),
        auth0_client_id: env("AUTH0_CLIENT_ID").or_else(|| config.auth0.client_id.clone()),
        auth0_audience: env("AUTH0_AUDIENCE").or_else(|| config.auth0.audience.clone()),
        bind,
        backend_url,
        placeholder_delay_ms,
        openai_api_key: env("OPENAI_API_KEY").or_else(|| config.openai.api_key.clone()),
        openai_base_url: env("OPENAI_BASE_URL")
            .or_else(|| config.openai.base_url.clone())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        openai_model: env("OPENAI_MODEL")
            .or_else(|| config.openai.model.clone())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        system_prompt: config
            .openai
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with(&LexiConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.bind, DEFAULT_BIND);
        assert_eq!(resolved.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(resolved.openai_model, "gpt-4o");
        assert_eq!(resolved.placeholder_delay_ms, 500);
        assert!(resolved.auth0_domain.is_none());
        assert!(!resolved.offline);
        assert!(resolved.system_prompt.contains("Polish law"));
    }

    #[test]
    fn test_env_overrides_config_and_cli_overrides_env() {
        let config = LexiConfig {
            client: ClientConfig {
                api_url: Some("http://from-config".into()),
                offline: None,
            },
            ..Default::default()
        };
        let vars: HashMap<&str, &str> = [("LEXI_API_URL", "http://from-env")].into();
        let env = |k: &str| vars.get(k).map(|v| v.to_string());

        let resolved = resolve_with(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.api_url, "http://from-env");

        let cli = CliOverrides {
            api_url: Some("http://from-cli".into()),
            ..Default::default()
        };
        let resolved = resolve_with(&config, &cli, env);
        assert_eq!(resolved.api_url, "http://from-cli");
    }

    #[test]
    fn test_empty_env_var_counts_as_unset() {
        let config = LexiConfig {
            auth0: Auth0Config {
                domain: Some("tenant.eu.auth0.com".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |k: &str| (k == "AUTH0_DOMAIN").then(String::new);
        let resolved = resolve_with(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.auth0_domain.as_deref(), Some("tenant.eu.auth0.com"));
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[client]
api_url = "https://lexi.example.pl"
offline = true

[auth0]
domain = "tenant.eu.auth0.com"
client_id = "abc123"

[server]
bind = "0.0.0.0:3000"
placeholder_delay_ms = 0

[openai]
api_key = "sk-test-123"
model = "gpt-4o-mini"
"#;
        let config: LexiConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.api_url, "https://lexi.example.pl");
        assert!(resolved.offline);
        assert_eq!(resolved.auth0_client_id.as_deref(), Some("abc123"));
        assert_eq!(resolved.bind, "0.0.0.0:3000");
        assert_eq!(resolved.placeholder_delay_ms, 0);
        assert_eq!(resolved.openai_api_key.as_deref(), Some("sk-test-123"));
        assert_eq!(resolved.openai_model, "gpt-4o-mini");
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[server]
backend_url = "http://localhost:9000"
"#;
        let config: LexiConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.backend_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.client.api_url.is_none());
        assert!(config.auth0.domain.is_none());
    }

    #[test]
    fn test_cli_offline_wins_over_config() {
        let resolved = resolve_with(
            &LexiConfig::default(),
            &CliOverrides {
                offline: true,
                ..Default::default()
            },
            no_env,
        );
        assert!(resolved.offline);
    }
}
