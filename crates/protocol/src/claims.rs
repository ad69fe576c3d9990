//! Access-token claim inspection.
//!
//! Access tokens are JWTs. The client never verifies signatures (the service
//! does that on every call); it only reads `sub` and `exp` to decide whether a
//! token from a link is still usable or must be refreshed first.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Subset of access-token claims used by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
	pub sub: String,
	pub exp: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
}

impl AccessTokenClaims {
	/// Decodes the payload segment of `token` without verifying it.
	///
	/// Returns `None` when the token is not a three-segment JWT or the payload
	/// is not base64url JSON carrying `sub` and `exp`.
	pub fn from_jwt(token: &str) -> Option<Self> {
		let mut segments = token.split('.');
		let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
		if segments.next().is_some() {
			return None;
		}
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
		serde_json::from_slice(&bytes).ok()
	}

	/// Returns `true` when the token is expired at `now` (unix seconds).
	pub fn is_expired_at(&self, now: u64) -> bool {
		self.exp <= now
	}
}
