// Configuration module: loads the two secrets the vendor API needs and
// bundles them with the base URL into a `ClientConfig`. The config is built
// once in `main` and handed to `ApiClient::new`; nothing here is global.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

/// Base URL used when `SIDEWORK_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.backbar.com";

/// API key and auth token read from the files passed with `-k` and `-t`.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub auth_token: String,
}

impl Credentials {
    /// Read both secret files. Only the first line of each file is used.
    pub fn load(key_path: &Path, token_path: &Path) -> Result<Self> {
        let api_key = read_secret(key_path).context("Failed to load API key")?;
        let auth_token = read_secret(token_path).context("Failed to load auth token")?;
        Ok(Credentials { api_key, auth_token })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Everything the HTTP client needs to talk to the vendor API.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
}

impl ClientConfig {
    /// Build a config using `SIDEWORK_API_URL` or fall back to
    /// [`DEFAULT_API_URL`].
    pub fn from_env(credentials: Credentials) -> Self {
        let base_url = std::env::var("SIDEWORK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(base_url, credentials)
    }

    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ClientConfig { base_url, credentials }
    }
}

/// Return the first line of `path` without its line terminator.
fn read_secret(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match data.lines().next() {
        Some(line) if !line.is_empty() => Ok(line.to_string()),
        _ => anyhow::bail!("{} is empty", path.display()),
    }
}
