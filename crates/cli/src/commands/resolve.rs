use std::path::Path;
use std::sync::Arc;

use linkgate::{DeepLinkCoordinator, origin};

use super::{auth_client, require_link};
use crate::error::{CliError, Result};
use crate::navigator::LoggingNavigator;
use crate::output::{DiagnosticLevel, OutputFormat, ResultBuilder, print_result};

pub async fn run(url: &str, code_verifier: Option<String>, config: Option<&Path>, format: OutputFormat) -> Result<()> {
	let url = require_link(url)?;
	let auth = Arc::new(auth_client(config, code_verifier)?);
	let coordinator = DeepLinkCoordinator::new(auth, Arc::new(LoggingNavigator));

	let resolution = coordinator
		.handle_link(Some(url))
		.await
		.ok_or_else(|| CliError::InvalidInput("link is empty".into()))?;

	let mut builder = ResultBuilder::new("resolve").url(origin(url));
	if let Some(failure) = resolution.recovery.outcome.failure() {
		builder = builder.diagnostic(DiagnosticLevel::Info, format!("no session established: {failure}"));
	}
	print_result(&builder.data(resolution.into_json()).build(), format);
	Ok(())
}
