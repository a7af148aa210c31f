//! Driver process lifecycle.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::{PipeTransport, TransportParts};

/// How to start the driver (e.g. `node driver/bridge.js`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCommand {
	pub program: String,
	pub args: Vec<String>,
	pub current_dir: Option<PathBuf>,
}

impl DriverCommand {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			current_dir: None,
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.current_dir = Some(dir.into());
		self
	}
}

/// A running driver. The child is killed if this handle is dropped.
pub struct DriverProcess {
	child: Child,
}

impl DriverProcess {
	/// Spawns the driver with piped stdin/stdout and inherited stderr.
	pub fn spawn(command: &DriverCommand) -> Result<(Self, TransportParts)> {
		let program = which::which(&command.program).map_err(|e| Error::DriverLaunch(format!("{}: {e}", command.program)))?;

		let mut cmd = Command::new(&program);
		cmd.args(&command.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true);
		if let Some(dir) = &command.current_dir {
			cmd.current_dir(dir);
		}

		let mut child = cmd.spawn().map_err(|e| Error::DriverLaunch(format!("{}: {e}", program.display())))?;
		let stdin = child.stdin.take().ok_or_else(|| Error::DriverLaunch("driver stdin unavailable".into()))?;
		let stdout = child.stdout.take().ok_or_else(|| Error::DriverLaunch("driver stdout unavailable".into()))?;

		debug!(target = "courier.driver", program = %program.display(), pid = ?child.id(), "driver started");
		Ok((Self { child }, PipeTransport::new(stdin, stdout)))
	}

	/// Waits up to `grace` for a voluntary exit, then kills the driver.
	pub async fn shutdown(mut self, grace: Duration) {
		match tokio::time::timeout(grace, self.child.wait()).await {
			Ok(Ok(status)) => debug!(target = "courier.driver", %status, "driver exited"),
			Ok(Err(err)) => warn!(target = "courier.driver", error = %err, "failed waiting for driver"),
			Err(_) => {
				debug!(target = "courier.driver", "driver still running; killing");
				if let Err(err) = self.child.kill().await {
					warn!(target = "courier.driver", error = %err, "failed to kill driver");
				}
			}
		}
	}
}
