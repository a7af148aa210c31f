//! `courier send`: deliver one file over the stored session.

use colored::Colorize;
use courier::collaborator::SessionStore;
use courier::{Bridge, DeliveryCoordinator, DeliveryRequest, Payload, PersistenceMode, Result};
use tracing::info;

use super::DRIVER_EXIT_GRACE;
use crate::cli::SendArgs;
use crate::context::CommandContext;

pub async fn execute(args: &SendArgs, ctx: &CommandContext) -> Result<()> {
	let config = &ctx.config;
	let (caption, file) = args.caption_and_file();
	let payload = Payload::new(file, caption);

	let connection_string = config.connection_string()?;
	// A missing file fails here, before the driver is started.
	payload.validate()?;

	info!(target = "courier", recipient = %args.recipient, file = %file.display(), "starting delivery");
	let bridge = Bridge::launch(&config.driver_command())?;
	let mut client = bridge.client();
	let mut store = bridge.store();
	let store: Option<&mut dyn SessionStore> = match config.persistence {
		PersistenceMode::Remote => Some(&mut store),
		PersistenceMode::Local => None,
	};

	let request = DeliveryRequest {
		recipient: args.recipient.clone(),
		payload,
	};
	let outcome = DeliveryCoordinator::new(config.delivery_options(connection_string))
		.run(&mut client, store, &request)
		.await;
	bridge.shutdown(DRIVER_EXIT_GRACE).await;

	let report = outcome?;
	println!(
		"{} {} to {} ({} bytes)",
		"Sent".green(),
		file.display(),
		report.target.name.bold(),
		report.bytes_sent
	);
	Ok(())
}
