//! Incoming link classification.
//!
//! A link carries parameters in two places: the query component and the
//! fragment. PKCE links put `code` in the query; implicit-flow links put
//! `access_token`/`refresh_token` in the fragment. Either may carry
//! `type=recovery` for password-reset links.

use std::collections::BTreeMap;

use linkgate_protocol::SessionTokens;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Parameter value that marks a password-recovery link.
pub const RECOVERY_TYPE: &str = "recovery";

const SENSITIVE_KEYS: &[&str] = &["access_token", "refresh_token", "code", "provider_token", "provider_refresh_token"];

/// What the link asks the app to do once a session is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkIntent {
	/// Password reset: route to the password-update flow.
	Recovery,
	Unclassified,
}

/// Structured view of one incoming link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDescriptor {
	pub query_params: BTreeMap<String, String>,
	pub fragment_params: BTreeMap<String, String>,
	pub intent: LinkIntent,
}

/// Error details the auth service appends to links it could not honor
/// (expired OTP, denied consent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkErrorInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// Parses `url` into a [`LinkDescriptor`].
///
/// Never fails: text that is not a URL simply yields fewer parameters. The
/// query component is the text between the first `?` and the first `#`; the
/// fragment is everything after the first `#`. Both use
/// `application/x-www-form-urlencoded` rules and the first occurrence of a
/// key wins.
pub fn classify(url: &str) -> LinkDescriptor {
	let (before_fragment, fragment) = match url.split_once('#') {
		Some((head, fragment)) => (head, Some(fragment)),
		None => (url, None),
	};
	let query = before_fragment.split_once('?').map(|(_, query)| query);

	let query_params = query.map(parse_params).unwrap_or_default();
	let fragment_params = fragment.map(parse_params).unwrap_or_default();
	let intent = detect_intent(&query_params, &fragment_params);

	LinkDescriptor {
		query_params,
		fragment_params,
		intent,
	}
}

/// Scheme, host, and path of a link, without parameters that may carry
/// credentials. Safe to log.
pub fn origin(url: &str) -> &str {
	let end = url.find(['?', '#']).unwrap_or(url.len());
	&url[..end]
}

fn parse_params(encoded: &str) -> BTreeMap<String, String> {
	let mut params = BTreeMap::new();
	for (key, value) in form_urlencoded::parse(encoded.as_bytes()) {
		if key.is_empty() {
			continue;
		}
		params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
	}
	params
}

fn detect_intent(query: &BTreeMap<String, String>, fragment: &BTreeMap<String, String>) -> LinkIntent {
	let link_type = query.get("type").or_else(|| fragment.get("type"));
	match link_type {
		Some(value) if value == RECOVERY_TYPE => LinkIntent::Recovery,
		_ => LinkIntent::Unclassified,
	}
}

impl LinkDescriptor {
	/// Returns `true` when neither component produced a parameter.
	pub fn is_malformed(&self) -> bool {
		self.query_params.is_empty() && self.fragment_params.is_empty()
	}

	pub fn is_recovery(&self) -> bool {
		self.intent == LinkIntent::Recovery
	}

	pub fn query(&self, key: &str) -> Option<&str> {
		self.query_params.get(key).map(String::as_str)
	}

	pub fn fragment(&self, key: &str) -> Option<&str> {
		self.fragment_params.get(key).map(String::as_str)
	}

	/// Authorization code carried in the query, if any.
	pub fn code(&self) -> Option<&str> {
		self.query("code").filter(|code| !code.is_empty())
	}

	/// Implicit-flow token pair, present only when both tokens are non-empty.
	pub fn fragment_tokens(&self) -> Option<SessionTokens> {
		let access = self.fragment("access_token").filter(|v| !v.is_empty())?;
		let refresh = self.fragment("refresh_token").filter(|v| !v.is_empty())?;
		Some(SessionTokens::new(access, refresh))
	}

	/// Error details appended by the auth service, checked in the query first.
	pub fn link_error(&self) -> Option<LinkErrorInfo> {
		let lookup = |key: &str| self.query(key).or_else(|| self.fragment(key)).map(str::to_string);
		let info = LinkErrorInfo {
			error: lookup("error"),
			code: lookup("error_code"),
			description: lookup("error_description"),
		};
		(info.error.is_some() || info.code.is_some() || info.description.is_some()).then_some(info)
	}

	/// Copy with credential values masked, safe for logs and command output.
	pub fn redacted(&self) -> LinkDescriptor {
		LinkDescriptor {
			query_params: redact(&self.query_params),
			fragment_params: redact(&self.fragment_params),
			intent: self.intent,
		}
	}
}

fn redact(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
	params
		.iter()
		.map(|(key, value)| {
			let value = if SENSITIVE_KEYS.contains(&key.as_str()) {
				format!("<redacted {} bytes>", value.len())
			} else {
				value.clone()
			};
			(key.clone(), value)
		})
		.collect()
}
