use courier::{CourierConfig, Result};

use crate::cli::Cli;

/// Resolved configuration for one command: file, then CLI overrides.
#[derive(Debug, Clone)]
pub struct CommandContext {
	pub config: CourierConfig,
}

impl CommandContext {
	pub fn new(cli: &Cli) -> Result<Self> {
		let cwd = std::env::current_dir()?;
		let mut config = CourierConfig::discover(cli.config.as_deref(), &cwd)?;
		if let Some(persistence) = cli.persistence {
			config.persistence = persistence.into();
		}
		if cli.headful {
			config.headless = false;
		}
		Ok(Self { config })
	}
}
