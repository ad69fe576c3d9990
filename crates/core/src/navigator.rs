//! Navigation collaborator interface and route values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::NavigationError;

/// Navigation target: a path plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
	pub path: String,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub params: BTreeMap<String, String>,
}

impl Route {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			params: BTreeMap::new(),
		}
	}

	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}

	pub fn param(&self, key: &str) -> Option<&str> {
		self.params.get(key).map(String::as_str)
	}

	/// Renders the route as `path?key=value`.
	pub fn to_href(&self) -> String {
		if self.params.is_empty() {
			return self.path.clone();
		}
		let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.params).finish();
		format!("{}?{}", self.path, query)
	}
}

impl fmt::Display for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_href())
	}
}

/// Host router capability used for the recovery-intent outcome.
pub trait Navigator: Send + Sync {
	fn navigate_to(&self, route: &Route) -> Result<(), NavigationError>;
}
