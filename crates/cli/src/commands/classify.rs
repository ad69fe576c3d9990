use linkgate::{classify, origin};
use serde_json::json;

use super::require_link;
use crate::error::Result;
use crate::output::{DiagnosticLevel, OutputFormat, ResultBuilder, print_result};

pub fn run(url: &str, format: OutputFormat) -> Result<()> {
	let url = require_link(url)?;
	let descriptor = classify(url);

	let mut builder = ResultBuilder::new("classify").url(origin(url));
	if descriptor.is_malformed() {
		builder = builder.diagnostic(DiagnosticLevel::Info, "link has no query or fragment parameters");
	}
	let link_error = descriptor.link_error();
	if let Some(info) = &link_error {
		let message = info.description.as_deref().or(info.code.as_deref()).or(info.error.as_deref()).unwrap_or("unknown");
		builder = builder.diagnostic(DiagnosticLevel::Warning, format!("link carries an auth error: {message}"));
	}

	let data = json!({
		"intent": descriptor.intent,
		"hasCode": descriptor.code().is_some(),
		"hasFragmentTokens": descriptor.fragment_tokens().is_some(),
		"linkError": link_error,
		"descriptor": descriptor.redacted(),
	});
	print_result(&builder.data(data).build(), format);
	Ok(())
}
