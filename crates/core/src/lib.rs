//! Deep-link driven session recovery.
//!
//! `linkgate` receives links that open the app (at cold start or while it
//! runs), tries to establish an authenticated session from them, and routes
//! password-recovery links to the password-update flow.
//!
//! # Components
//!
//! * [`link`]: parses a link into query/fragment parameters and an intent.
//! * [`recovery`]: ordered strategies (PKCE code exchange, then implicit-flow
//!   fragment tokens) that stop at the first success.
//! * [`coordinator`]: the per-link state machine and the process-wide
//!   listener that feeds it.
//!
//! The auth service, link source, and navigator are collaborators injected
//! through [`AuthSessionService`], [`LinkSource`], and [`Navigator`].
//! [`testing`] has in-memory versions of each.

pub mod auth;
pub mod coordinator;
pub mod error;
pub mod link;
pub mod navigator;
pub mod recovery;
pub mod source;
pub mod testing;

pub use auth::{AuthSessionService, SharedAuthService};
pub use coordinator::{CoordinatorConfig, CoordinatorHandle, DeepLinkCoordinator, LinkResolution, LinkState};
pub use error::{AuthError, NavigationError, Result};
pub use link::{LinkDescriptor, LinkErrorInfo, LinkIntent, classify, origin};
pub use linkgate_protocol::{Session, SessionTokens, User};
pub use navigator::{Navigator, Route};
pub use recovery::{AttemptRecord, RecoveryChain, RecoveryFailure, RecoveryOutcome, RecoveryReport, RecoveryStrategy};
pub use source::{ChannelLinkSource, LinkEvent, LinkSource, LinkSubscription};
