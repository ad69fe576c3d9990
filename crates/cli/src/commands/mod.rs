mod classify;
mod listen;
mod resolve;

use std::path::{Path, PathBuf};

use linkgate_runtime::{AuthConfig, GoTrueClient};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::output::{ResultBuilder, print_result};

/// Runs the parsed command. Failures are also printed as an error envelope.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let name = cli.command.name();
	let config = cli.config;

	let result = match cli.command {
		Commands::Classify { url } => classify::run(&url, format),
		Commands::Resolve { url, code_verifier } => resolve::run(&url, code_verifier, config.as_deref(), format).await,
		Commands::Listen { initial, code_verifier } => listen::run(initial, code_verifier, config.as_deref(), format).await,
	};

	if let Err(err) = &result {
		let failure = ResultBuilder::<Value>::new(name).error(err.code(), err.to_string()).build();
		print_result(&failure, format);
	}
	result
}

/// `<config dir>/linkgate/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("linkgate").join("config.json"))
}

fn auth_client(config_path: Option<&Path>, code_verifier: Option<String>) -> Result<GoTrueClient> {
	let path = config_path.map(Path::to_path_buf).or_else(default_config_path);
	debug!(target = "linkgate.cli", path = ?path, "loading auth config");
	let config = AuthConfig::load(path.as_deref())?;
	let client = GoTrueClient::new(&config)?;
	if let Some(verifier) = code_verifier {
		client.set_code_verifier(verifier);
	}
	Ok(client)
}

fn require_link(url: &str) -> Result<&str> {
	let url = url.trim();
	if url.is_empty() {
		return Err(CliError::InvalidInput("link is empty".into()));
	}
	Ok(url)
}
