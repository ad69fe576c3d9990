use std::path::Path;
use std::sync::Arc;

use linkgate::{ChannelLinkSource, DeepLinkCoordinator};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use super::auth_client;
use crate::error::Result;
use crate::navigator::LoggingNavigator;
use crate::output::{OutputFormat, ResultBuilder, print_result};

/// Treats each stdin line as a link delivered while the app runs. EOF or
/// Ctrl-C tears the listener down; links already queued still finish.
pub async fn run(initial: Option<String>, code_verifier: Option<String>, config: Option<&Path>, format: OutputFormat) -> Result<()> {
	let auth = Arc::new(auth_client(config, code_verifier)?);
	let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
	let coordinator = Arc::new(DeepLinkCoordinator::new(auth, Arc::new(LoggingNavigator)).with_reports(reports_tx));
	let source = Arc::new(ChannelLinkSource::new(initial));

	let handle = coordinator.clone().activate(source.clone());
	let printer = tokio::spawn(async move {
		while let Some(resolution) = reports_rx.recv().await {
			let result = ResultBuilder::new("listen").data(resolution.into_json()).build();
			print_result(&result, format);
		}
	});

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let read_result = loop {
		tokio::select! {
			line = lines.next_line() => match line {
				Ok(Some(line)) => {
					source.emit(line.trim());
				}
				Ok(None) => break Ok(()),
				Err(err) => break Err(err),
			},
			_ = tokio::signal::ctrl_c() => {
				info!(target = "linkgate.cli", "interrupted");
				break Ok(());
			}
		}
	};

	let handled = handle.deactivate().await;
	// Last sender goes with the coordinator; the printer drains and exits.
	drop(coordinator);
	let _ = printer.await;
	read_result?;

	let summary = ResultBuilder::new("listen").data(json!({ "handled": handled })).build();
	print_result(&summary, format);
	Ok(())
}
