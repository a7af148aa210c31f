//! Collaborators backed by the external driver process.
//!
//! One [`Bridge`] owns the driver and a single [`Connection`]; the client and
//! store handles it hands out share that connection.

mod client;
mod store;

use std::sync::Arc;
use std::time::Duration;

use courier_runtime::{Connection, DriverCommand, DriverProcess, TransportParts};
use tokio::task::JoinHandle;
use tracing::debug;

pub use client::BridgeClient;
pub use store::BridgeStore;

use crate::error::Result;

pub struct Bridge {
	connection: Arc<Connection>,
	process: Option<DriverProcess>,
	dispatch: JoinHandle<()>,
}

impl Bridge {
	/// Spawns the driver and starts dispatching its messages.
	pub fn launch(command: &DriverCommand) -> Result<Self> {
		let (process, parts) = DriverProcess::spawn(command)?;
		Ok(Self::start(parts, Some(process)))
	}

	/// Runs over already-built transport parts with no child process.
	pub fn attach(parts: TransportParts) -> Self {
		Self::start(parts, None)
	}

	fn start(parts: TransportParts, process: Option<DriverProcess>) -> Self {
		let connection = Arc::new(Connection::new(parts));
		let dispatch = tokio::spawn({
			let connection = Arc::clone(&connection);
			async move { connection.run().await }
		});
		Self {
			connection,
			process,
			dispatch,
		}
	}

	pub fn client(&self) -> BridgeClient {
		BridgeClient::new(Arc::clone(&self.connection))
	}

	pub fn store(&self) -> BridgeStore {
		BridgeStore::new(Arc::clone(&self.connection))
	}

	/// Gives the driver `grace` to exit on its own, then kills it.
	pub async fn shutdown(self, grace: Duration) {
		if let Some(process) = self.process {
			process.shutdown(grace).await;
		}
		self.dispatch.abort();
		debug!(target = "courier.driver", "bridge shut down");
	}
}
