use std::sync::Arc;

use async_trait::async_trait;
use courier_protocol::{AuthStrategy, AutomationOptions, Conversation, MediaPayload, SendMediaOptions, methods};
use courier_runtime::{Connection, EventReceiver};
use serde_json::json;

use crate::collaborator::MessagingClient;
use crate::error::Result;

/// [`MessagingClient`] that forwards every call to the driver.
pub struct BridgeClient {
	connection: Arc<Connection>,
}

impl BridgeClient {
	pub fn new(connection: Arc<Connection>) -> Self {
		Self { connection }
	}
}

#[async_trait]
impl MessagingClient for BridgeClient {
	fn take_events(&mut self) -> Option<EventReceiver> {
		self.connection.take_events()
	}

	async fn initialize(&mut self, auth: &AuthStrategy, automation: &AutomationOptions) -> Result<()> {
		self.connection
			.send_message(methods::CLIENT_INITIALIZE, json!({ "auth": auth, "automation": automation }))
			.await?;
		Ok(())
	}

	async fn list_conversations(&mut self) -> Result<Vec<Conversation>> {
		let value = self.connection.send_message(methods::CLIENT_LIST_CONVERSATIONS, json!({})).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn send_typing_state(&mut self, chat_id: &str) -> Result<()> {
		self.connection
			.send_message(methods::CLIENT_SEND_TYPING, json!({ "chatId": chat_id }))
			.await?;
		Ok(())
	}

	async fn clear_state(&mut self, chat_id: &str) -> Result<()> {
		self.connection
			.send_message(methods::CLIENT_CLEAR_STATE, json!({ "chatId": chat_id }))
			.await?;
		Ok(())
	}

	async fn send_media(&mut self, chat_id: &str, media: MediaPayload, options: SendMediaOptions) -> Result<()> {
		self.connection
			.send_message(
				methods::CLIENT_SEND_MEDIA,
				json!({ "chatId": chat_id, "media": media, "options": options }),
			)
			.await?;
		Ok(())
	}

	async fn destroy(&mut self) -> Result<()> {
		self.connection.send_message(methods::CLIENT_DESTROY, json!({})).await?;
		Ok(())
	}
}
