use linkgate_runtime::ConfigError;
use thiserror::Error;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Config(_) => ErrorCode::ConfigError,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Io(_) => ErrorCode::IoError,
		}
	}
}

pub type Result<T> = std::result::Result<T, CliError>;
