use async_trait::async_trait;
use tracing::debug;

use super::{RecoveryFailure, RecoveryOutcome, RecoveryStrategy};
use crate::auth::SharedAuthService;
use crate::link;

/// Implicit-flow fallback: installs `access_token`/`refresh_token` from the
/// link fragment.
///
/// Links produced by the older implicit flow carry both tokens directly. When
/// either is missing the service is never contacted.
pub struct FragmentTokenStrategy {
	auth: SharedAuthService,
}

impl FragmentTokenStrategy {
	pub fn new(auth: SharedAuthService) -> Self {
		Self { auth }
	}
}

#[async_trait]
impl RecoveryStrategy for FragmentTokenStrategy {
	fn name(&self) -> &'static str {
		"fragment_tokens"
	}

	async fn attempt(&self, url: &str) -> RecoveryOutcome {
		let Some(tokens) = link::classify(url).fragment_tokens() else {
			return RecoveryFailure::MissingTokens.into();
		};

		debug!(
			target = "linkgate.recovery",
			access_len = tokens.access_token.len(),
			refresh_len = tokens.refresh_token.len(),
			"installing fragment tokens"
		);
		match self.auth.set_session(tokens).await {
			Ok(session) => RecoveryOutcome::Success { session },
			Err(err) => RecoveryFailure::Install(err).into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::error::AuthError;
	use crate::testing::{AuthCall, FakeAuthService};

	#[tokio::test]
	async fn missing_refresh_token_never_calls_service() {
		let auth = Arc::new(FakeAuthService::new());
		let strategy = FragmentTokenStrategy::new(auth.clone());

		let outcome = strategy.attempt("app://cb#access_token=AAA&type=recovery").await;
		assert!(matches!(outcome.failure(), Some(RecoveryFailure::MissingTokens)));
		assert!(auth.calls().is_empty());
	}

	#[tokio::test]
	async fn tokens_in_query_are_ignored() {
		let auth = Arc::new(FakeAuthService::new());
		let strategy = FragmentTokenStrategy::new(auth.clone());

		let outcome = strategy.attempt("app://cb?access_token=AAA&refresh_token=BBB").await;
		assert!(matches!(outcome.failure(), Some(RecoveryFailure::MissingTokens)));
		assert_eq!(auth.install_count(), 0);
	}

	#[tokio::test]
	async fn installs_token_pair() {
		let auth = Arc::new(FakeAuthService::new());
		let strategy = FragmentTokenStrategy::new(auth.clone());

		let outcome = strategy.attempt("app://cb#access_token=AAA&refresh_token=BBB").await;
		assert!(outcome.is_success());
		assert_eq!(
			auth.calls(),
			vec![AuthCall::Install {
				access_token: "AAA".into(),
				refresh_token: "BBB".into(),
			}]
		);
	}

	#[tokio::test]
	async fn install_error_becomes_failure() {
		let auth = Arc::new(FakeAuthService::new().failing_install(AuthError::MalformedToken));
		let strategy = FragmentTokenStrategy::new(auth);

		let outcome = strategy.attempt("app://cb#access_token=AAA&refresh_token=BBB").await;
		assert!(matches!(outcome.failure(), Some(RecoveryFailure::Install(AuthError::MalformedToken))));
	}
}
