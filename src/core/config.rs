//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chat-review/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::annotation::GatingPolicy;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub task: TaskConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AnnotationConfig {
    pub options: Option<Vec<String>>,
    pub gating: Option<GatingPolicy>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FrameConfig {
    pub catch_all_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TaskConfig {
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub local_reply_delay_ms: Option<u64>,
    pub local_max_turns: Option<u32>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_AGENT_ID: &str = "worker";
pub const DEFAULT_AGENT_NAME: &str = "You";
pub const DEFAULT_CATCH_ALL_DELAY_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOCAL_REPLY_DELAY_MS: u64 = 600;
pub const DEFAULT_LOCAL_MAX_TURNS: u32 = 5;

const DEFAULT_ANNOTATION_OPTIONS: &[&str] = &["good", "okay", "bad", "flag"];

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub agent_id: String,
    pub agent_name: String,
    pub annotation_options: Vec<String>,
    pub gating: GatingPolicy,
    pub catch_all_delay: Duration,
    /// `None` runs the offline local agent.
    pub task_endpoint: Option<String>,
    pub request_timeout: Duration,
    pub local_reply_delay: Duration,
    pub local_max_turns: u32,
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

/// Returns the path to `~/.chat-review/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chat-review").join("config.toml"))
}

/// Load config from `~/.chat-review/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ReviewConfig::default()`.
pub fn load_config() -> Result<ReviewConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ReviewConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ReviewConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ReviewConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ReviewConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# chat-review configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# agent_id = "worker"                # Or set CHAT_REVIEW_AGENT_ID
# agent_name = "You"

# [annotation]
# options = ["good", "okay", "bad", "flag"]
# gating = "previous_message"        # "previous_message", "all_prior" or "disabled"

# [frame]
# catch_all_delay_ms = 3000          # Deferred size report after mount

# [task]
# endpoint = "http://localhost:3000" # Or set CHAT_REVIEW_TASK_URL; unset = local agent
# request_timeout_secs = 30
# local_reply_delay_ms = 600
# local_max_turns = 5
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(
    config: &ReviewConfig,
    cli_endpoint: Option<&str>,
    cli_gating: Option<GatingPolicy>,
) -> ResolvedConfig {
    // Agent id: env → config → default
    let agent_id = std::env::var("CHAT_REVIEW_AGENT_ID")
        .ok()
        .or_else(|| config.general.agent_id.clone())
        .unwrap_or_else(|| DEFAULT_AGENT_ID.to_string());

    // Endpoint: CLI → env → config → none (local agent)
    let task_endpoint = cli_endpoint
        .map(str::to_string)
        .or_else(|| std::env::var("CHAT_REVIEW_TASK_URL").ok())
        .or_else(|| config.task.endpoint.clone())
        .filter(|url| !url.trim().is_empty());

    let annotation_options = config
        .annotation
        .options
        .clone()
        .filter(|options| !options.is_empty())
        .unwrap_or_else(|| {
            DEFAULT_ANNOTATION_OPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

    ResolvedConfig {
        agent_id,
        agent_name: config
            .general
            .agent_name
            .clone()
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
        annotation_options,
        gating: cli_gating
            .or(config.annotation.gating)
            .unwrap_or_default(),
        catch_all_delay: Duration::from_millis(
            config
                .frame
                .catch_all_delay_ms
                .unwrap_or(DEFAULT_CATCH_ALL_DELAY_MS),
        ),
        task_endpoint,
        request_timeout: Duration::from_secs(
            config
                .task
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        local_reply_delay: Duration::from_millis(
            config
                .task
                .local_reply_delay_ms
                .unwrap_or(DEFAULT_LOCAL_REPLY_DELAY_MS),
        ),
        local_max_turns: config
            .task
            .local_max_turns
            .unwrap_or(DEFAULT_LOCAL_MAX_TURNS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = ReviewConfig::default();
        assert!(config.general.agent_id.is_none());
        assert!(config.annotation.options.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = ReviewConfig::default();
        let resolved = resolve(&config, None, None);
        assert_eq!(resolved.agent_name, DEFAULT_AGENT_NAME);
        assert_eq!(resolved.gating, GatingPolicy::PreviousMessage);
        assert_eq!(resolved.catch_all_delay, Duration::from_millis(3000));
        assert_eq!(resolved.annotation_options, vec!["good", "okay", "bad", "flag"]);
        assert_eq!(resolved.local_max_turns, DEFAULT_LOCAL_MAX_TURNS);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = ReviewConfig {
            general: GeneralConfig {
                agent_id: None,
                agent_name: Some("Annotator".to_string()),
            },
            annotation: AnnotationConfig {
                options: Some(vec!["yes".to_string(), "no".to_string()]),
                gating: Some(GatingPolicy::AllPrior),
            },
            frame: FrameConfig {
                catch_all_delay_ms: Some(500),
            },
            task: TaskConfig {
                request_timeout_secs: Some(5),
                ..Default::default()
            },
        };
        let resolved = resolve(&config, None, None);
        assert_eq!(resolved.agent_name, "Annotator");
        assert_eq!(resolved.annotation_options, vec!["yes", "no"]);
        assert_eq!(resolved.gating, GatingPolicy::AllPrior);
        assert_eq!(resolved.catch_all_delay, Duration::from_millis(500));
        assert_eq!(resolved.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = ReviewConfig {
            annotation: AnnotationConfig {
                gating: Some(GatingPolicy::AllPrior),
                ..Default::default()
            },
            task: TaskConfig {
                endpoint: Some("http://config:1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some("http://cli:2"), Some(GatingPolicy::Disabled));
        assert_eq!(resolved.task_endpoint.as_deref(), Some("http://cli:2"));
        assert_eq!(resolved.gating, GatingPolicy::Disabled);
    }

    #[test]
    fn test_empty_options_fall_back_to_defaults() {
        let config = ReviewConfig {
            annotation: AnnotationConfig {
                options: Some(vec![]),
                gating: None,
            },
            ..Default::default()
        };
        let resolved = resolve(&config, None, None);
        assert_eq!(resolved.annotation_options.len(), 4);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[annotation]
gating = "disabled"

[task]
endpoint = "http://localhost:3000"
"#;
        let config: ReviewConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.annotation.gating, Some(GatingPolicy::Disabled));
        assert_eq!(
            config.task.endpoint.as_deref(),
            Some("http://localhost:3000")
        );
        assert!(config.general.agent_name.is_none());
        assert!(config.frame.catch_all_delay_ms.is_none());
    }

    #[test]
    fn test_unknown_gating_is_a_parse_error() {
        let result: Result<ReviewConfig, _> = toml::from_str("[annotation]\ngating = \"sometimes\"");
        assert!(result.is_err());
    }
}
