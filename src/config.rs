use anyhow::{Context, Result, bail};
use reconcile::Request;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Supported resource file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => bail!(
                "Unsupported resource file {} (expected .toml or .json)",
                path.display()
            ),
        }
    }
}

/// Expand `~` and env vars in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

/// Load a request resource from a TOML or JSON file
pub fn load_request(path: &Path) -> Result<Request> {
    let path = expand_path(path);
    let format = ConfigFormat::from_path(&path)?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    parse_request(&content, format)
        .with_context(|| format!("Invalid resource file {}", path.display()))
}

/// Parse a request resource
pub fn parse_request(content: &str, format: ConfigFormat) -> Result<Request> {
    let mut request: Request = match format {
        ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON format")?,
        ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML format")?,
    };

    request.name = request.name.trim().to_string();
    if request.name.is_empty() {
        bail!("Resource is missing a name");
    }
    if request.for_provider.mappings.is_empty() {
        bail!("Resource {} declares no mappings", request.name);
    }

    Ok(request)
}

/// Transport settings shared by every observation in one run
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl TransportConfig {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("reqsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
