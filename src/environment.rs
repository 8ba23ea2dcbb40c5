// src/environment.rs
//! Load client configuration: defaults, then `resumate.yaml`, then
//! environment variables. CLI flags are applied by the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ClientConfig, ConfigError, ConfigOverrides};
use crate::session::{Identity, StaticIdentity, TokenIdentity, User};
use crate::utils::resolve_path;

pub const CONFIG_FILE: &str = "resumate.yaml";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: ConfigOverrides,
    #[serde(default)]
    production: ConfigOverrides,
}

pub fn get_environment() -> String {
    std::env::var("RESUMATE_ENV")
        .or_else(|_| std::env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| "local".to_string())
}

/// Load configuration for the current process.
pub fn load(config_path: Option<&Path>) -> Result<ClientConfig> {
    let environment = get_environment();
    info!("Loading configuration for environment: {}", environment);

    let vars: HashMap<String, String> = std::env::vars().collect();
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    let mut config = ClientConfig::default();
    if path.exists() {
        config = config.apply(load_file_section(&path, &environment)?);
    } else {
        debug!("No {} found, using defaults", path.display());
    }
    config = config.apply(overrides_from_vars(&vars)?);

    config.download_dir = resolve_path(&config.download_dir)?;
    Ok(config)
}

fn load_file_section(path: &Path, environment: &str) -> Result<ConfigOverrides> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ConfigFile = serde_yaml::from_str(&content).map_err(|e| ConfigError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(match environment {
        "production" => file.production,
        _ => file.local,
    })
}

/// `RESUMATE_*` variables as overrides.
pub fn overrides_from_vars(vars: &HashMap<String, String>) -> Result<ConfigOverrides, ConfigError> {
    let timeout_seconds = parse_var(vars, "RESUMATE_TIMEOUT_SECS")?;
    let rows_per_page = parse_var(vars, "RESUMATE_ROWS_PER_PAGE")?;

    Ok(ConfigOverrides {
        api_url: vars.get("RESUMATE_API_URL").cloned(),
        timeout_seconds,
        download_dir: vars.get("RESUMATE_DOWNLOAD_DIR").map(PathBuf::from),
        rows_per_page,
    })
}

fn parse_var<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a number", raw))
            })
        })
        .transpose()
}

/// Session values gathered from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl SessionSettings {
    pub fn from_env() -> Self {
        Self {
            token: std::env::var("RESUMATE_SESSION_TOKEN").ok(),
            user_id: std::env::var("RESUMATE_USER_ID").ok(),
            display_name: std::env::var("RESUMATE_USER_NAME").ok(),
            email: std::env::var("RESUMATE_USER_EMAIL").ok(),
        }
    }

    /// Values set here win over `other`.
    pub fn or(self, other: SessionSettings) -> Self {
        Self {
            token: self.token.or(other.token),
            user_id: self.user_id.or(other.user_id),
            display_name: self.display_name.or(other.display_name),
            email: self.email.or(other.email),
        }
    }

    /// A session token wins over explicit values; no values means anonymous.
    pub fn into_identity(self) -> Result<Arc<dyn Identity>> {
        if let Some(token) = self.token.filter(|t| !t.trim().is_empty()) {
            let identity =
                TokenIdentity::from_token(&token).context("Failed to read session token")?;
            return Ok(Arc::new(identity));
        }

        let identity: Arc<dyn Identity> = match self.user_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                let mut user = User::new(id);
                if let Some(name) = self.display_name {
                    user = user.with_display_name(name);
                }
                if let Some(email) = self.email {
                    user = user.with_email(email);
                }
                Arc::new(StaticIdentity::signed_in(user))
            }
            None => Arc::new(StaticIdentity::anonymous()),
        };
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_overrides_from_vars() {
        let overrides = overrides_from_vars(&vars(&[
            ("RESUMATE_API_URL", "https://api.example.com"),
            ("RESUMATE_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(overrides.api_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(overrides.timeout_seconds, Some(30));
        assert_eq!(overrides.rows_per_page, None);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = overrides_from_vars(&vars(&[("RESUMATE_ROWS_PER_PAGE", "ten")])).unwrap_err();
        assert!(err.to_string().contains("RESUMATE_ROWS_PER_PAGE"));
    }

    #[test]
    fn test_file_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "local:\n  api_url: http://localhost:8080/api\nproduction:\n  api_url: https://resume.example.com/api\n  rows_per_page: 25\n",
        )
        .unwrap();

        let local = load_file_section(&path, "local").unwrap();
        assert_eq!(local.api_url.as_deref(), Some("http://localhost:8080/api"));

        let prod = load_file_section(&path, "production").unwrap();
        assert_eq!(prod.rows_per_page, Some(25));
    }

    #[test]
    fn test_session_settings_identity() {
        let anon = SessionSettings::default().into_identity().unwrap();
        assert!(!anon.is_signed_in());

        let settings = SessionSettings {
            user_id: Some("user_9".to_string()),
            display_name: Some("Lin".to_string()),
            email: Some("lin@example.com".to_string()),
            ..SessionSettings::default()
        };
        let identity = settings.into_identity().unwrap();
        assert_eq!(identity.user_id().as_deref(), Some("user_9"));
        assert_eq!(identity.greeting_name(), "Lin");
        assert_eq!(
            identity.current_user().and_then(|u| u.email),
            Some("lin@example.com".to_string())
        );

        let flags = SessionSettings {
            user_id: Some("flag_user".to_string()),
            ..SessionSettings::default()
        };
        let merged = flags.or(SessionSettings {
            user_id: Some("env_user".to_string()),
            email: Some("e@example.com".to_string()),
            ..SessionSettings::default()
        });
        assert_eq!(merged.user_id.as_deref(), Some("flag_user"));
        assert_eq!(merged.email.as_deref(), Some("e@example.com"));
    }
}
