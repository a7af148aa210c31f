//! `courier auth`: one-time interactive bootstrap.

use colored::Colorize;
use courier::collaborator::SessionStore;
use courier::{BootstrapCoordinator, Bridge, Completion, PersistenceMode, Result, TerminalQrRenderer};
use tracing::info;

use super::DRIVER_EXIT_GRACE;
use crate::context::CommandContext;

pub async fn execute(ctx: &CommandContext) -> Result<()> {
	let config = &ctx.config;
	// Resolved before the driver starts so a missing secret never spawns it.
	let connection_string = config.connection_string()?;

	info!(target = "courier", persistence = %config.persistence, "starting bootstrap");
	let bridge = Bridge::launch(&config.driver_command())?;
	let mut client = bridge.client();
	let mut store = bridge.store();
	let store: Option<&mut dyn SessionStore> = match config.persistence {
		PersistenceMode::Remote => Some(&mut store),
		PersistenceMode::Local => None,
	};

	let outcome = BootstrapCoordinator::new(config.bootstrap_options(connection_string), TerminalQrRenderer::stdout())
		.run(&mut client, store)
		.await;
	bridge.shutdown(DRIVER_EXIT_GRACE).await;

	match outcome?.completion {
		Completion::Persisted => println!("{}", "Session authenticated and saved to the store.".green()),
		Completion::LocalOnly => println!("{}", "Session authenticated and saved locally.".green()),
		Completion::Degraded => println!(
			"{}",
			"Session authenticated, but the store never confirmed the save. Continuing anyway.".yellow()
		),
	}
	Ok(())
}
