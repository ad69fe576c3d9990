//! Deep-link coordinator: the single entry point for incoming links.
//!
//! Each link runs through a small state machine:
//!
//! ```text
//! Idle -> Resolving -> Classifying -> Routing -> Idle
//! ```
//!
//! Resolving runs the [`RecoveryChain`]. Classifying parses the link whether
//! or not a session was recovered, so a recovery link without a valid token
//! still routes. Routing opens the password-update flow for recovery links
//! and does nothing otherwise. Empty links never leave Idle.
//!
//! Handling is serialized: a link that arrives while another is in flight
//! waits for the machine to return to Idle, so two session mutations never
//! race against the auth service.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::auth::SharedAuthService;
use crate::link::{self, LinkDescriptor, LinkIntent};
use crate::navigator::{Navigator, Route};
use crate::recovery::{RecoveryChain, RecoveryReport};
use crate::source::LinkSource;

/// Per-link state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
	Idle,
	Resolving,
	Classifying,
	Routing,
}

/// Routing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinatorConfig {
	/// Path of the password-update flow.
	pub recovery_path: String,
	/// Value of the `mode` parameter passed to that flow.
	pub recovery_mode: String,
}

impl Default for CoordinatorConfig {
	fn default() -> Self {
		Self {
			recovery_path: "/reset-password".to_string(),
			recovery_mode: "update".to_string(),
		}
	}
}

impl CoordinatorConfig {
	pub fn recovery_route(&self) -> Route {
		Route::new(self.recovery_path.as_str()).with_param("mode", self.recovery_mode.as_str())
	}
}

/// What happened to one link.
#[derive(Debug, Clone)]
pub struct LinkResolution {
	pub descriptor: LinkDescriptor,
	pub recovery: RecoveryReport,
	/// Route the navigator was asked to open, if any.
	pub navigation: Option<Route>,
}

impl LinkResolution {
	pub fn session_established(&self) -> bool {
		self.recovery.outcome.is_success()
	}

	pub fn intent(&self) -> LinkIntent {
		self.descriptor.intent
	}

	/// Structured summary with credentials masked.
	pub fn into_json(self) -> Value {
		let session = self.recovery.outcome.session().map(|session| {
			json!({
				"userId": session.user_id(),
				"expiresAt": session.expires_at,
			})
		});
		json!({
			"sessionEstablished": self.recovery.outcome.is_success(),
			"strategy": self.recovery.strategy(),
			"session": session,
			"attempts": self.recovery.attempts,
			"intent": self.descriptor.intent,
			"linkError": self.descriptor.link_error(),
			"descriptor": self.descriptor.redacted(),
			"navigation": self.navigation.as_ref().map(|route| json!({
				"path": route.path,
				"params": route.params,
				"href": route.to_href(),
			})),
		})
	}
}

/// Drives recovery, classification, and routing for incoming links.
pub struct DeepLinkCoordinator {
	chain: RecoveryChain,
	navigator: Arc<dyn Navigator>,
	config: CoordinatorConfig,
	state: Mutex<LinkState>,
	serial: tokio::sync::Mutex<()>,
	reports: Option<mpsc::UnboundedSender<LinkResolution>>,
}

impl DeepLinkCoordinator {
	/// Creates a coordinator with the standard recovery chain.
	pub fn new(auth: SharedAuthService, navigator: Arc<dyn Navigator>) -> Self {
		Self::with_chain(RecoveryChain::standard(auth), navigator)
	}

	/// Creates a coordinator around a custom chain.
	pub fn with_chain(chain: RecoveryChain, navigator: Arc<dyn Navigator>) -> Self {
		Self {
			chain,
			navigator,
			config: CoordinatorConfig::default(),
			state: Mutex::new(LinkState::Idle),
			serial: tokio::sync::Mutex::new(()),
			reports: None,
		}
	}

	pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
		self.config = config;
		self
	}

	/// Sends a copy of every resolution produced by the activated listener
	/// to `sink`.
	pub fn with_reports(mut self, sink: mpsc::UnboundedSender<LinkResolution>) -> Self {
		self.reports = Some(sink);
		self
	}

	pub fn config(&self) -> &CoordinatorConfig {
		&self.config
	}

	pub fn state(&self) -> LinkState {
		*self.state.lock()
	}

	fn transition(&self, next: LinkState) {
		let mut state = self.state.lock();
		trace!(target = "linkgate.coordinator", from = ?*state, to = ?next, "state transition");
		*state = next;
	}

	/// Handles one link end to end.
	///
	/// Returns `None` without any effect when `url` is absent or empty.
	/// Otherwise always runs to completion; no failure propagates.
	pub async fn handle_link(&self, url: Option<&str>) -> Option<LinkResolution> {
		let url = url.filter(|url| !url.is_empty())?;
		let _serial = self.serial.lock().await;
		debug!(target = "linkgate.coordinator", origin = %link::origin(url), "handling link");

		self.transition(LinkState::Resolving);
		let recovery = self.chain.recover_with_report(url).await;

		self.transition(LinkState::Classifying);
		let descriptor = link::classify(url);
		if descriptor.is_malformed() {
			debug!(target = "linkgate.coordinator", origin = %link::origin(url), "link has no usable parameters");
		}
		if let Some(info) = descriptor.link_error() {
			warn!(
				target = "linkgate.coordinator",
				error = ?info.error,
				code = ?info.code,
				description = ?info.description,
				"link carries an auth error"
			);
		}

		self.transition(LinkState::Routing);
		let navigation = self.route(&descriptor);

		self.transition(LinkState::Idle);
		Some(LinkResolution {
			descriptor,
			recovery,
			navigation,
		})
	}

	fn route(&self, descriptor: &LinkDescriptor) -> Option<Route> {
		if !descriptor.is_recovery() {
			return None;
		}
		let route = self.config.recovery_route();
		match self.navigator.navigate_to(&route) {
			Ok(()) => info!(target = "linkgate.coordinator", route = %route, "opened password update flow"),
			Err(err) => warn!(target = "linkgate.coordinator", route = %route, error = %err, "navigation failed"),
		}
		Some(route)
	}

	async fn dispatch(&self, url: Option<&str>) -> bool {
		let Some(resolution) = self.handle_link(url).await else {
			return false;
		};
		if let Some(reports) = &self.reports {
			// The receiver may have gone away; the link was still handled.
			let _ = reports.send(resolution);
		}
		true
	}

	/// Subscribes to `source`, handles its cold-start link, then handles
	/// foreground links one at a time until deactivated.
	///
	/// Must be called from within a tokio runtime.
	pub fn activate(self: Arc<Self>, source: Arc<dyn LinkSource>) -> CoordinatorHandle {
		let mut subscription = source.subscribe();
		let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

		let worker = tokio::spawn(async move {
			let mut handled = 0usize;

			let initial = source.initial_url().await;
			if initial.as_deref().is_some_and(|url| !url.is_empty()) {
				debug!(target = "linkgate.coordinator", "processing cold start link");
			}
			if self.dispatch(initial.as_deref()).await {
				handled += 1;
			}

			loop {
				tokio::select! {
					biased;
					_ = &mut shutdown_rx => break,
					event = subscription.next() => match event {
						Some(event) => {
							if self.dispatch(Some(&event.url)).await {
								handled += 1;
							}
						}
						None => {
							debug!(target = "linkgate.coordinator", "link source closed");
							break;
						}
					},
				}
			}

			subscription.unsubscribe();
			while let Some(event) = subscription.try_next() {
				if self.dispatch(Some(&event.url)).await {
					handled += 1;
				}
			}
			info!(target = "linkgate.coordinator", handled, "link subscription released");
			handled
		});

		CoordinatorHandle {
			shutdown: Some(shutdown_tx),
			worker,
		}
	}
}

/// Handle to an activated coordinator.
///
/// Dropping the handle also stops delivery once the worker notices.
pub struct CoordinatorHandle {
	shutdown: Option<oneshot::Sender<()>>,
	worker: JoinHandle<usize>,
}

impl CoordinatorHandle {
	/// Releases the link subscription and waits for the worker.
	///
	/// The link in flight, and links already queued before the release,
	/// finish first. Returns how many links were handled in total.
	pub async fn deactivate(mut self) -> usize {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}
		match self.worker.await {
			Ok(handled) => handled,
			Err(err) => {
				error!(target = "linkgate.coordinator", error = %err, "link worker terminated abnormally");
				0
			}
		}
	}

	pub fn is_finished(&self) -> bool {
		self.worker.is_finished()
	}
}
