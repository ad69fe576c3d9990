use async_trait::async_trait;

use super::{RecoveryFailure, RecoveryOutcome, RecoveryStrategy};
use crate::auth::SharedAuthService;

/// PKCE authorization-code exchange.
///
/// Hands the whole link to the auth service, which locates the code and pairs
/// it with the verifier it stored when the flow started.
pub struct CodeExchangeStrategy {
	auth: SharedAuthService,
}

impl CodeExchangeStrategy {
	pub fn new(auth: SharedAuthService) -> Self {
		Self { auth }
	}
}

#[async_trait]
impl RecoveryStrategy for CodeExchangeStrategy {
	fn name(&self) -> &'static str {
		"code_exchange"
	}

	async fn attempt(&self, url: &str) -> RecoveryOutcome {
		match self.auth.exchange_code_for_session(url).await {
			Ok(session) => RecoveryOutcome::Success { session },
			Err(err) => RecoveryFailure::Exchange(err).into(),
		}
	}
}
