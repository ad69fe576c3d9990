//! `linkgate` command-line front end.
//!
//! Wraps the resolver for scripting and manual checks of auth emails:
//! `classify` is offline, `resolve` handles one link against the configured
//! auth service, and `listen` feeds stdin lines through the long-lived
//! listener exactly as the app feeds foreground links.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod navigator;
pub mod output;
