//! Runtime adapters for `linkgate`.
//!
//! [`GoTrueClient`] talks to the hosted auth service over HTTP and
//! [`AuthConfig`] resolves where that service lives and how to reach it.

pub mod config;
pub mod gotrue;

pub use config::{AuthConfig, AuthConfigFile, ConfigError};
pub use gotrue::GoTrueClient;
