use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "linkgate")]
#[command(about = "Inspect and resolve auth deep links against the hosted auth service")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Auth config file (defaults to <config dir>/linkgate/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Parse a link and report its parameters and intent without contacting the auth service
	Classify { url: String },

	/// Establish a session from a link and report where it routes
	Resolve {
		url: String,
		/// PKCE code verifier saved when the sign-in flow started
		#[arg(long, value_name = "VERIFIER")]
		code_verifier: Option<String>,
	},

	/// Handle links read from stdin, one per line, until EOF
	Listen {
		/// Link that opened the app
		#[arg(long, value_name = "URL")]
		initial: Option<String>,
		/// PKCE code verifier saved when the sign-in flow started
		#[arg(long, value_name = "VERIFIER")]
		code_verifier: Option<String>,
	},
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Classify { .. } => "classify",
			Commands::Resolve { .. } => "resolve",
			Commands::Listen { .. } => "listen",
		}
	}
}
