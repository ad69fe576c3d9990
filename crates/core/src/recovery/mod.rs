//! Session recovery strategy chain.
//!
//! A link may establish a session in more than one way. Strategies are tried
//! in order and the chain stops at the first success. A failing strategy is
//! not an error for the chain: a link without a code is expected (a pure
//! recovery link) and simply hands over to the next strategy.
//!
//! The standard chain is:
//!
//! 1. [`CodeExchangeStrategy`]: PKCE authorization-code exchange.
//! 2. [`FragmentTokenStrategy`]: implicit-flow tokens in the fragment.

mod code_exchange;
mod fragment_tokens;

use async_trait::async_trait;
use linkgate_protocol::Session;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use code_exchange::CodeExchangeStrategy;
pub use fragment_tokens::FragmentTokenStrategy;

use crate::auth::SharedAuthService;
use crate::error::AuthError;

/// Why a single strategy did not produce a session.
#[derive(Debug, Clone, Error)]
pub enum RecoveryFailure {
	#[error("code exchange failed: {0}")]
	Exchange(#[source] AuthError),

	#[error("link carries no access/refresh token pair")]
	MissingTokens,

	#[error("token install failed: {0}")]
	Install(#[source] AuthError),

	#[error("no recovery strategies configured")]
	NoStrategies,
}

impl RecoveryFailure {
	/// Returns `true` when the failure is routine for ordinary links.
	pub fn is_expected(&self) -> bool {
		match self {
			RecoveryFailure::Exchange(err) => err.is_expected(),
			RecoveryFailure::MissingTokens => true,
			RecoveryFailure::Install(_) | RecoveryFailure::NoStrategies => false,
		}
	}
}

/// Result of one strategy, or of the whole chain.
#[derive(Debug, Clone)]
pub enum RecoveryOutcome {
	Success { session: Session },
	Failure { reason: RecoveryFailure },
}

impl RecoveryOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, RecoveryOutcome::Success { .. })
	}

	pub fn session(&self) -> Option<&Session> {
		match self {
			RecoveryOutcome::Success { session } => Some(session),
			RecoveryOutcome::Failure { .. } => None,
		}
	}

	pub fn failure(&self) -> Option<&RecoveryFailure> {
		match self {
			RecoveryOutcome::Success { .. } => None,
			RecoveryOutcome::Failure { reason } => Some(reason),
		}
	}
}

impl From<RecoveryFailure> for RecoveryOutcome {
	fn from(reason: RecoveryFailure) -> Self {
		RecoveryOutcome::Failure { reason }
	}
}

/// One way of turning a link into a session.
#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
	/// Stable name used in logs and reports.
	fn name(&self) -> &'static str;

	/// Attempts recovery. Must not panic or propagate collaborator errors.
	async fn attempt(&self, url: &str) -> RecoveryOutcome;
}

/// Record of one strategy attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
	pub strategy: &'static str,
	pub succeeded: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

/// Chain outcome plus the attempts that led to it.
#[derive(Debug, Clone)]
pub struct RecoveryReport {
	pub outcome: RecoveryOutcome,
	pub attempts: Vec<AttemptRecord>,
}

impl RecoveryReport {
	/// Name of the strategy that produced the session.
	pub fn strategy(&self) -> Option<&'static str> {
		self.attempts.iter().find(|attempt| attempt.succeeded).map(|attempt| attempt.strategy)
	}
}

/// Ordered list of strategies evaluated until one succeeds.
#[derive(Default)]
pub struct RecoveryChain {
	strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl RecoveryChain {
	/// Creates an empty chain.
	pub fn new() -> Self {
		Self::default()
	}

	/// Code exchange first, fragment tokens second.
	pub fn standard(auth: SharedAuthService) -> Self {
		Self::new()
			.with_strategy(CodeExchangeStrategy::new(auth.clone()))
			.with_strategy(FragmentTokenStrategy::new(auth))
	}

	/// Appends a strategy to the end of the chain.
	pub fn with_strategy(mut self, strategy: impl RecoveryStrategy + 'static) -> Self {
		self.strategies.push(Box::new(strategy));
		self
	}

	pub fn strategy_names(&self) -> Vec<&'static str> {
		self.strategies.iter().map(|strategy| strategy.name()).collect()
	}

	pub fn len(&self) -> usize {
		self.strategies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strategies.is_empty()
	}

	/// Runs the chain: the first success, or the last failure.
	pub async fn recover(&self, url: &str) -> RecoveryOutcome {
		self.recover_with_report(url).await.outcome
	}

	/// Runs the chain and keeps a record of every attempt.
	pub async fn recover_with_report(&self, url: &str) -> RecoveryReport {
		let mut attempts = Vec::with_capacity(self.strategies.len());
		let mut last_failure = RecoveryFailure::NoStrategies;

		for strategy in &self.strategies {
			match strategy.attempt(url).await {
				RecoveryOutcome::Success { session } => {
					info!(
						target = "linkgate.recovery",
						strategy = strategy.name(),
						user = %session.user_id(),
						"session recovered"
					);
					attempts.push(AttemptRecord {
						strategy: strategy.name(),
						succeeded: true,
						reason: None,
					});
					return RecoveryReport {
						outcome: RecoveryOutcome::Success { session },
						attempts,
					};
				}
				RecoveryOutcome::Failure { reason } => {
					if reason.is_expected() {
						debug!(target = "linkgate.recovery", strategy = strategy.name(), reason = %reason, "strategy did not apply");
					} else {
						warn!(target = "linkgate.recovery", strategy = strategy.name(), reason = %reason, "strategy failed");
					}
					attempts.push(AttemptRecord {
						strategy: strategy.name(),
						succeeded: false,
						reason: Some(reason.to_string()),
					});
					last_failure = reason;
				}
			}
		}

		debug!(target = "linkgate.recovery", attempts = attempts.len(), "recovery exhausted");
		RecoveryReport {
			outcome: last_failure.into(),
			attempts,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;
	use crate::testing::{AuthCall, FakeAuthService, fake_session};

	struct Fixed {
		name: &'static str,
		succeed: bool,
		calls: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl RecoveryStrategy for Fixed {
		fn name(&self) -> &'static str {
			self.name
		}

		async fn attempt(&self, _url: &str) -> RecoveryOutcome {
			self.calls.fetch_add(1, Ordering::SeqCst);
			if self.succeed {
				RecoveryOutcome::Success {
					session: fake_session("AAA", "BBB", self.name),
				}
			} else {
				RecoveryFailure::MissingTokens.into()
			}
		}
	}

	fn fixed(name: &'static str, succeed: bool) -> (Fixed, Arc<AtomicUsize>) {
		let calls = Arc::new(AtomicUsize::new(0));
		(
			Fixed {
				name,
				succeed,
				calls: calls.clone(),
			},
			calls,
		)
	}

	#[tokio::test]
	async fn empty_chain_reports_no_strategies() {
		let outcome = RecoveryChain::new().recover("app://cb?code=XYZ").await;
		assert!(matches!(outcome.failure(), Some(RecoveryFailure::NoStrategies)));
	}

	#[tokio::test]
	async fn stops_at_first_success() {
		let (first, first_calls) = fixed("first", true);
		let (second, second_calls) = fixed("second", true);
		let chain = RecoveryChain::new().with_strategy(first).with_strategy(second);

		let report = chain.recover_with_report("app://cb").await;
		assert!(report.outcome.is_success());
		assert_eq!(report.strategy(), Some("first"));
		assert_eq!(first_calls.load(Ordering::SeqCst), 1);
		assert_eq!(second_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn failure_falls_through_to_later_strategy() {
		let (first, _) = fixed("first", false);
		let (second, _) = fixed("second", false);
		let (third, third_calls) = fixed("third", true);
		let chain = RecoveryChain::new().with_strategy(first).with_strategy(second).with_strategy(third);

		let report = chain.recover_with_report("app://cb").await;
		assert_eq!(report.strategy(), Some("third"));
		assert_eq!(report.attempts.len(), 3);
		assert_eq!(third_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn exhausted_chain_returns_last_failure() {
		let auth = Arc::new(FakeAuthService::new());
		let chain = RecoveryChain::standard(auth.clone());

		let report = chain.recover_with_report("app://cb?type=recovery").await;
		assert!(matches!(report.outcome.failure(), Some(RecoveryFailure::MissingTokens)));
		assert_eq!(report.strategy(), None);
		let names: Vec<_> = report.attempts.iter().map(|a| a.strategy).collect();
		assert_eq!(names, ["code_exchange", "fragment_tokens"]);
		assert_eq!(auth.calls(), vec![AuthCall::Exchange("app://cb?type=recovery".into())]);
	}

	#[tokio::test]
	async fn fragment_tokens_installed_after_failed_exchange() {
		let auth = Arc::new(FakeAuthService::new().failing_exchange(AuthError::Transport("offline".into())));
		let chain = RecoveryChain::standard(auth.clone());

		let outcome = chain.recover("app://cb?code=XYZ#access_token=AAA&refresh_token=BBB").await;
		let session = outcome.session().unwrap();
		assert_eq!(session.access_token, "AAA");
		assert_eq!(session.refresh_token, "BBB");
		assert_eq!(auth.install_count(), 1);
	}

	#[tokio::test]
	async fn successful_exchange_skips_fragment_tokens() {
		let auth = Arc::new(FakeAuthService::new());
		let chain = RecoveryChain::standard(auth.clone());

		let report = chain.recover_with_report("app://cb?code=XYZ#access_token=AAA&refresh_token=BBB").await;
		assert_eq!(report.strategy(), Some("code_exchange"));
		assert_eq!(auth.install_count(), 0);
	}

	#[test]
	fn standard_chain_order() {
		let chain = RecoveryChain::standard(Arc::new(FakeAuthService::new()));
		assert_eq!(chain.strategy_names(), ["code_exchange", "fragment_tokens"]);
		assert_eq!(chain.len(), 2);
	}
}
