//! Token grant requests and error payloads for `/auth/v1/token`.

use serde::{Deserialize, Serialize};

/// `grant_type` query values accepted by the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	Pkce,
	RefreshToken,
}

impl GrantType {
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::Pkce => "pkce",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}

/// Body of `POST /auth/v1/token?grant_type=pkce`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkceGrant {
	pub auth_code: String,
	pub code_verifier: String,
}

/// Body of `POST /auth/v1/token?grant_type=refresh_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenGrant {
	pub refresh_token: String,
}

/// Error body returned by the auth service.
///
/// The service has used two shapes over time: OAuth-style
/// (`error`/`error_description`) and API-style (`code`/`error_code`/`msg`).
/// Both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<u16>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub msg: Option<String>,
}

impl ApiErrorBody {
	/// Machine-readable code, preferring `error_code` over `error`.
	pub fn code(&self) -> Option<&str> {
		self.error_code.as_deref().or(self.error.as_deref())
	}

	/// Human-readable message, falling back to the code.
	pub fn message(&self) -> String {
		self.msg
			.as_deref()
			.or(self.error_description.as_deref())
			.or_else(|| self.code())
			.unwrap_or("unknown error")
			.to_string()
	}
}
