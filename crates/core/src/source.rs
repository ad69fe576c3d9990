//! Link source collaborator and an in-process channel implementation.
//!
//! The host OS delivers links two ways: the link that launched the process
//! (queried once) and a stream of links opened while the app runs. A
//! [`LinkSubscription`] must be released explicitly (or dropped) to stop
//! delivery.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// Payload of a foreground link event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEvent {
	pub url: String,
}

impl LinkEvent {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}
}

/// Host capability that delivers incoming links.
#[async_trait]
pub trait LinkSource: Send + Sync {
	/// Link that launched the process, if any.
	async fn initial_url(&self) -> Option<String>;

	/// Starts delivery of foreground link events.
	fn subscribe(&self) -> LinkSubscription;
}

type Release = Box<dyn FnOnce() + Send>;

/// Receiving end of a link subscription.
pub struct LinkSubscription {
	events: mpsc::UnboundedReceiver<LinkEvent>,
	release: Option<Release>,
}

impl LinkSubscription {
	/// Wraps a receiver; `release` runs once on unsubscribe or drop.
	pub fn new(events: mpsc::UnboundedReceiver<LinkEvent>, release: impl FnOnce() + Send + 'static) -> Self {
		Self {
			events,
			release: Some(Box::new(release)),
		}
	}

	/// Waits for the next event. Returns `None` once the source is gone or the
	/// subscription was released and its backlog drained.
	pub async fn next(&mut self) -> Option<LinkEvent> {
		self.events.recv().await
	}

	/// Returns an already-queued event without waiting.
	pub fn try_next(&mut self) -> Option<LinkEvent> {
		self.events.try_recv().ok()
	}

	/// Stops delivery at the source. Events already queued stay readable.
	pub fn unsubscribe(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}

	pub fn is_active(&self) -> bool {
		self.release.is_some()
	}
}

impl Drop for LinkSubscription {
	fn drop(&mut self) {
		self.unsubscribe();
	}
}

#[derive(Default)]
struct Subscribers {
	next_id: u64,
	senders: Vec<(u64, mpsc::UnboundedSender<LinkEvent>)>,
}

/// [`LinkSource`] fed from inside the process.
///
/// Used by the CLI (stdin lines become foreground links) and by tests.
#[derive(Clone, Default)]
pub struct ChannelLinkSource {
	initial: Option<String>,
	subscribers: Arc<Mutex<Subscribers>>,
}

impl ChannelLinkSource {
	pub fn new(initial: Option<String>) -> Self {
		Self {
			initial,
			subscribers: Arc::default(),
		}
	}

	/// Delivers `url` to every live subscriber and returns how many received it.
	pub fn emit(&self, url: impl Into<String>) -> usize {
		let event = LinkEvent::new(url);
		let mut subscribers = self.subscribers.lock();
		subscribers.senders.retain(|(_, tx)| !tx.is_closed());
		let delivered = subscribers
			.senders
			.iter()
			.filter(|(_, tx)| tx.send(event.clone()).is_ok())
			.count();
		trace!(target = "linkgate.source", delivered, "link event emitted");
		delivered
	}

	pub fn subscriber_count(&self) -> usize {
		self.subscribers.lock().senders.len()
	}
}

#[async_trait]
impl LinkSource for ChannelLinkSource {
	async fn initial_url(&self) -> Option<String> {
		self.initial.clone()
	}

	fn subscribe(&self) -> LinkSubscription {
		let (tx, rx) = mpsc::unbounded_channel();
		let id = {
			let mut subscribers = self.subscribers.lock();
			let id = subscribers.next_id;
			subscribers.next_id += 1;
			subscribers.senders.push((id, tx));
			id
		};

		let subscribers = Arc::downgrade(&self.subscribers);
		LinkSubscription::new(rx, move || {
			if let Some(subscribers) = subscribers.upgrade() {
				subscribers.lock().senders.retain(|(other, _)| *other != id);
				trace!(target = "linkgate.source", id, "link subscription released");
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn emitted_links_reach_each_subscriber() {
		let source = ChannelLinkSource::new(None);
		let mut first = source.subscribe();
		let mut second = source.subscribe();

		assert_eq!(source.emit("app://cb?code=1"), 2);
		assert_eq!(first.next().await.unwrap().url, "app://cb?code=1");
		assert_eq!(second.next().await.unwrap().url, "app://cb?code=1");
	}

	#[tokio::test]
	async fn unsubscribe_stops_delivery_but_keeps_backlog() {
		let source = ChannelLinkSource::new(None);
		let mut subscription = source.subscribe();
		source.emit("app://one");

		subscription.unsubscribe();
		assert!(!subscription.is_active());
		assert_eq!(source.subscriber_count(), 0);
		assert_eq!(source.emit("app://two"), 0);

		assert_eq!(subscription.try_next().unwrap().url, "app://one");
		assert!(subscription.try_next().is_none());
		assert!(subscription.next().await.is_none());
	}

	#[tokio::test]
	async fn dropping_subscription_releases_it() {
		let source = ChannelLinkSource::new(Some("app://cold".into()));
		drop(source.subscribe());
		assert_eq!(source.subscriber_count(), 0);
		assert_eq!(source.initial_url().await.as_deref(), Some("app://cold"));
	}
}
