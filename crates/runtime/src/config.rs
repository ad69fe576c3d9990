//! Auth service configuration.
//!
//! Values come from an optional JSON file and the environment; the
//! environment wins. The `EXPO_PUBLIC_` variable names used by the mobile
//! app's bundler are accepted as fallbacks so one `.env` serves both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const URL_VARS: &[&str] = &["SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"];
pub const ANON_KEY_VARS: &[&str] = &["SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"];
pub const CODE_VERIFIER_VAR: &str = "LINKGATE_CODE_VERIFIER";

pub const DEFAULT_CLIENT_INFO: &str = "mindfuljournal-app";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Errors raised while building an [`AuthConfig`] or its HTTP client.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("missing auth configuration: set {0}")]
	Missing(&'static str),

	#[error("invalid auth service url {url:?}: {reason}")]
	InvalidUrl { url: String, reason: String },

	#[error("failed to read config {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("failed to build HTTP client: {0}")]
	HttpClient(String),
}

/// Partial configuration as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigFile {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub anon_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_info: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_ms: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code_verifier: Option<String>,
}

impl AuthConfigFile {
	/// Loads a config file. A missing file yields an empty config.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => {
				return Err(ConfigError::Read {
					path: path.to_path_buf(),
					source,
				});
			}
		};
		serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Fully resolved auth service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
	/// Project base URL, e.g. `https://abc.supabase.co`.
	pub url: Url,
	/// Public (anon) API key sent with every request.
	pub anon_key: String,
	/// Value of the `X-Client-Info` header.
	pub client_info: String,
	pub timeout: Duration,
	/// PKCE verifier stored when the sign-in flow started, if known.
	pub code_verifier: Option<String>,
}

impl AuthConfig {
	pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
		Ok(Self {
			url: parse_base_url(url)?,
			anon_key: anon_key.into(),
			client_info: DEFAULT_CLIENT_INFO.to_string(),
			timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
			code_verifier: None,
		})
	}

	/// Merges `file` with variables from `env`; variables win.
	pub fn resolve(file: AuthConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let first = |names: &[&str]| names.iter().copied().find_map(|name| env(name).filter(|value| !value.trim().is_empty()));

		let url = first(URL_VARS).or(file.url).ok_or(ConfigError::Missing(URL_VARS[0]))?;
		let anon_key = first(ANON_KEY_VARS).or(file.anon_key).ok_or(ConfigError::Missing(ANON_KEY_VARS[0]))?;

		let mut config = Self::new(url.trim(), anon_key.trim())?;
		if let Some(client_info) = file.client_info {
			config.client_info = client_info;
		}
		if let Some(timeout_ms) = file.timeout_ms {
			config.timeout = Duration::from_millis(timeout_ms);
		}
		config.code_verifier = first(&[CODE_VERIFIER_VAR]).or(file.code_verifier);
		Ok(config)
	}

	/// Loads `path` (if given) and overlays the process environment.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let file = match path {
			Some(path) => AuthConfigFile::load(path)?,
			None => AuthConfigFile::default(),
		};
		Self::resolve(file, |name| std::env::var(name).ok())
	}
}

/// Parses the project URL and makes sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let mut url = Url::parse(raw).map_err(|err| ConfigError::InvalidUrl {
		url: raw.to_string(),
		reason: err.to_string(),
	})?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::InvalidUrl {
			url: raw.to_string(),
			reason: format!("unsupported scheme {}", url.scheme()),
		});
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}
	Ok(url)
}
