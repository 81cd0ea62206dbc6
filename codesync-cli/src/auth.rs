//! Credentials for the code-generation service.
//!
//! Read from `~/.codesync.auth` (JSON), with `CODESYNC_HOST`,
//! `CODESYNC_USER` and `CODESYNC_TOKEN` taking precedence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const AUTH_FILE_NAME: &str = ".codesync.auth";
pub const DEFAULT_HOST: &str = "http://localhost:3003";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token: String,
}

impl AuthConfig {
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.token.is_empty()
    }
}

pub fn auth_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(AUTH_FILE_NAME))
}

/// Load credentials; a missing file yields empty values.
pub fn load_from(path: &Path) -> Result<AuthConfig> {
    let mut auth = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))?
    } else {
        AuthConfig::default()
    };

    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    if let Some(host) = env("CODESYNC_HOST") {
        auth.host = host;
    }
    if let Some(user) = env("CODESYNC_USER") {
        auth.user = user;
    }
    if let Some(token) = env("CODESYNC_TOKEN") {
        auth.token = token;
    }
    if auth.host.is_empty() {
        auth.host = DEFAULT_HOST.to_owned();
    }
    Ok(auth)
}
