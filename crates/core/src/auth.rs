//! Auth session collaborator interface.

use std::sync::Arc;

use async_trait::async_trait;
use linkgate_protocol::{Session, SessionTokens};

use crate::error::Result;

/// Session-management service that owns the process-wide active session.
///
/// The resolver only asks for mutations; it never stores the returned
/// [`Session`] or reads the active one back. Both calls may suspend on a
/// network round trip and either return a session or an error, never
/// partial state.
#[async_trait]
pub trait AuthSessionService: Send + Sync {
	/// Exchanges the authorization code carried by `url` for a session (PKCE).
	async fn exchange_code_for_session(&self, url: &str) -> Result<Session>;

	/// Installs an access/refresh token pair as the active session.
	async fn set_session(&self, tokens: SessionTokens) -> Result<Session>;
}

/// Shared handle injected into the resolver.
pub type SharedAuthService = Arc<dyn AuthSessionService>;
