use linkgate::{NavigationError, Navigator, Route};
use tracing::info;

/// Navigator for a process with no screens: accepts every route and logs it.
/// The route itself is reported in the command output.
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
	fn navigate_to(&self, route: &Route) -> Result<(), NavigationError> {
		info!(target = "linkgate.cli", href = %route.to_href(), "navigate");
		Ok(())
	}
}
