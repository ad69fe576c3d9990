//! Session and user payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authenticated user as returned by `GET /auth/v1/user` and embedded in sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub aud: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
}

/// Credential bundle issued by the auth service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	pub access_token: String,
	pub refresh_token: String,
	#[serde(default = "default_token_type")]
	pub token_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Unix timestamp (seconds) after which the access token is rejected.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<u64>,
	pub user: User,
}

fn default_token_type() -> String {
	"bearer".to_string()
}

impl Session {
	/// Returns the owning user's id.
	pub fn user_id(&self) -> &str {
		&self.user.id
	}
}

// Tokens never reach logs through `{:?}`.
impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("access_token", &Redacted(self.access_token.len()))
			.field("refresh_token", &Redacted(self.refresh_token.len()))
			.field("token_type", &self.token_type)
			.field("expires_at", &self.expires_at)
			.field("user", &self.user)
			.finish()
	}
}

/// Access/refresh token pair carried by implicit-flow links.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
	pub access_token: String,
	pub refresh_token: String,
}

impl SessionTokens {
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: refresh_token.into(),
		}
	}
}

impl fmt::Debug for SessionTokens {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionTokens")
			.field("access_token", &Redacted(self.access_token.len()))
			.field("refresh_token", &Redacted(self.refresh_token.len()))
			.finish()
	}
}

struct Redacted(usize);

impl fmt::Debug for Redacted {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<redacted {} bytes>", self.0)
	}
}
