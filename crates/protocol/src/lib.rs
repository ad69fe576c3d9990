//! Wire types for the auth REST API.
//!
//! This crate contains the serde-serializable types exchanged with the
//! hosted auth service (GoTrue-compatible) over HTTPS. These types represent
//! the "protocol layer": the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: no behavior beyond serialization and token inspection
//! * 1:1 with the REST payloads: field names match the service's JSON
//! * Stable: changes only when the service's wire format changes
//!
//! The resolver and HTTP client in `linkgate` and `linkgate-runtime` build on
//! top of these types.

pub mod auth_exchange;
pub mod claims;
pub mod session;

pub use auth_exchange::*;
pub use claims::*;
pub use session::*;
