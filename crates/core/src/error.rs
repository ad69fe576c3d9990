//! Error types for collaborator calls.
//!
//! None of these halt the resolver: the recovery chain turns [`AuthError`] into
//! a strategy failure, and the coordinator logs [`NavigationError`].

use thiserror::Error;

/// Failure reported by an [`AuthSessionService`](crate::AuthSessionService).
#[derive(Debug, Clone, Error)]
pub enum AuthError {
	/// The link carries no authorization code to exchange.
	#[error("no authorization code found in link")]
	MissingCode,

	/// No PKCE code verifier is available for the exchange.
	#[error("PKCE code verifier is not available")]
	MissingCodeVerifier,

	/// The link could not be parsed as a URL.
	#[error("malformed link: {0}")]
	MalformedLink(String),

	/// The access token could not be decoded.
	#[error("malformed access token")]
	MalformedToken,

	/// The service answered with an error payload.
	#[error("auth service rejected request ({status}): {message}")]
	Api {
		status: u16,
		code: Option<String>,
		message: String,
	},

	/// The request never produced a usable response.
	#[error("auth transport error: {0}")]
	Transport(String),

	/// The response body did not match the expected shape.
	#[error("failed to decode auth response: {0}")]
	Decode(String),
}

impl AuthError {
	/// Returns `true` for errors that are expected on ordinary links.
	///
	/// A pure recovery link has no code, and a link opened on a device that
	/// did not start the flow has no verifier.
	pub fn is_expected(&self) -> bool {
		matches!(self, AuthError::MissingCode | AuthError::MissingCodeVerifier | AuthError::MalformedLink(_))
	}
}

/// Failure reported by a [`Navigator`](crate::Navigator).
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
	#[error("navigator is unavailable: {0}")]
	Unavailable(String),

	#[error("unknown route: {0}")]
	UnknownRoute(String),
}

/// Result alias for auth collaborator calls.
pub type Result<T, E = AuthError> = std::result::Result<T, E>;
