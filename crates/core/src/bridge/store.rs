use std::sync::Arc;

use async_trait::async_trait;
use courier_protocol::methods;
use courier_runtime::Connection;
use serde_json::json;

use crate::collaborator::SessionStore;
use crate::error::{Error, Result};

/// [`SessionStore`] living inside the driver next to the client.
pub struct BridgeStore {
	connection: Arc<Connection>,
}

impl BridgeStore {
	pub fn new(connection: Arc<Connection>) -> Self {
		Self { connection }
	}
}

#[async_trait]
impl SessionStore for BridgeStore {
	async fn connect(&mut self, connection_string: &str) -> Result<()> {
		self.connection
			.send_message(methods::STORE_CONNECT, json!({ "uri": connection_string }))
			.await
			.map_err(|err| Error::Connection(err.to_string()))?;
		Ok(())
	}

	async fn disconnect(&mut self) -> Result<()> {
		self.connection.send_message(methods::STORE_DISCONNECT, json!({})).await?;
		Ok(())
	}
}
