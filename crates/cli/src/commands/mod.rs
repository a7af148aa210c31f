mod auth;
mod export;
mod send;

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use courier::{Error, Result};

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;

/// How long the driver gets to exit by itself after release.
const DRIVER_EXIT_GRACE: Duration = Duration::from_secs(5);

pub async fn dispatch(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Auth => auth::execute(&CommandContext::new(&cli)?).await,
		Commands::Send(args) => send::execute(args, &CommandContext::new(&cli)?).await,
		Commands::ExportSession { auth_dir: Some(dir) } => export::execute(dir),
		Commands::ExportSession { auth_dir: None } => {
			let context = CommandContext::new(&cli)?;
			export::execute(Path::new(&context.config.data_path))
		}
	}
}

/// Prints a failure for the operator on stderr.
pub fn report_failure(err: &Error) {
	eprintln!("{} {err}", "error:".red().bold());
	if let Error::Resolution { candidates, .. } = err {
		if !candidates.is_empty() {
			eprintln!("Available chats (top {}):", candidates.len());
			for name in candidates {
				eprintln!("  - {name}");
			}
		}
	}
	if let Some(hint) = err.hint() {
		eprintln!("{}", hint.yellow());
	}
}
