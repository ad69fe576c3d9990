//! In-memory collaborators for exercising the resolver without a network.
//!
//! # Example
//!
//! ```ignore
//! let auth = Arc::new(FakeAuthService::new().failing_exchange(AuthError::MissingCode));
//! let navigator = Arc::new(RecordingNavigator::new());
//! let coordinator = DeepLinkCoordinator::new(auth.clone(), navigator.clone());
//!
//! coordinator.handle_link(Some("app://cb?type=recovery")).await;
//! assert_eq!(navigator.routes().len(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use linkgate_protocol::{Session, SessionTokens, User};
use parking_lot::Mutex;

use crate::auth::AuthSessionService;
use crate::error::{AuthError, NavigationError, Result};
use crate::link;
use crate::navigator::{Navigator, Route};

/// Call observed by [`FakeAuthService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCall {
	Exchange(String),
	Install { access_token: String, refresh_token: String },
}

/// Builds a session value for tests.
pub fn fake_session(access_token: &str, refresh_token: &str, user_id: &str) -> Session {
	Session {
		access_token: access_token.to_string(),
		refresh_token: refresh_token.to_string(),
		token_type: "bearer".to_string(),
		expires_in: Some(3600),
		expires_at: None,
		user: User {
			id: user_id.to_string(),
			email: None,
			aud: Some("authenticated".to_string()),
			role: Some("authenticated".to_string()),
		},
	}
}

/// Scriptable [`AuthSessionService`].
///
/// By default the code exchange succeeds only for links that carry a `code`
/// query parameter, and token installs always succeed.
#[derive(Default)]
pub struct FakeAuthService {
	exchange_error: Option<AuthError>,
	install_error: Option<AuthError>,
	latency: Option<Duration>,
	calls: Mutex<Vec<AuthCall>>,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}

impl FakeAuthService {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every exchange fails with `err`.
	pub fn failing_exchange(mut self, err: AuthError) -> Self {
		self.exchange_error = Some(err);
		self
	}

	/// Every install fails with `err`.
	pub fn failing_install(mut self, err: AuthError) -> Self {
		self.install_error = Some(err);
		self
	}

	/// Each call suspends for `latency` before answering.
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn calls(&self) -> Vec<AuthCall> {
		self.calls.lock().clone()
	}

	pub fn exchange_count(&self) -> usize {
		self.calls.lock().iter().filter(|call| matches!(call, AuthCall::Exchange(_))).count()
	}

	pub fn install_count(&self) -> usize {
		self.calls.lock().iter().filter(|call| matches!(call, AuthCall::Install { .. })).count()
	}

	/// Highest number of calls that were suspended at the same time.
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	async fn enter(&self, call: AuthCall) {
		self.calls.lock().push(call);
		let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(current, Ordering::SeqCst);
		if let Some(latency) = self.latency {
			tokio::time::sleep(latency).await;
		}
	}

	fn leave(&self) {
		self.in_flight.fetch_sub(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl AuthSessionService for FakeAuthService {
	async fn exchange_code_for_session(&self, url: &str) -> Result<Session> {
		self.enter(AuthCall::Exchange(url.to_string())).await;
		let result = match (&self.exchange_error, link::classify(url).code()) {
			(Some(err), _) => Err(err.clone()),
			(None, Some(code)) => Ok(fake_session(&format!("pkce-access-{code}"), &format!("pkce-refresh-{code}"), "user-pkce")),
			(None, None) => Err(AuthError::MissingCode),
		};
		self.leave();
		result
	}

	async fn set_session(&self, tokens: SessionTokens) -> Result<Session> {
		self.enter(AuthCall::Install {
			access_token: tokens.access_token.clone(),
			refresh_token: tokens.refresh_token.clone(),
		})
		.await;
		let result = match &self.install_error {
			Some(err) => Err(err.clone()),
			None => Ok(fake_session(&tokens.access_token, &tokens.refresh_token, "user-implicit")),
		};
		self.leave();
		result
	}
}

/// [`Navigator`] that records every route it is asked to open.
#[derive(Default)]
pub struct RecordingNavigator {
	routes: Mutex<Vec<Route>>,
	error: Option<NavigationError>,
}

impl RecordingNavigator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records routes but reports `err` for each.
	pub fn failing(err: NavigationError) -> Self {
		Self {
			routes: Mutex::default(),
			error: Some(err),
		}
	}

	pub fn routes(&self) -> Vec<Route> {
		self.routes.lock().clone()
	}
}

impl Navigator for RecordingNavigator {
	fn navigate_to(&self, route: &Route) -> std::result::Result<(), NavigationError> {
		self.routes.lock().push(route.clone());
		match &self.error {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}
}
