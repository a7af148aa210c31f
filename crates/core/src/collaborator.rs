//! Seams to the external collaborators.
//!
//! The coordinators only ever talk to the messaging client, the durable store
//! and the scan-code side channel through these traits. The bridge-backed
//! implementations live in [`crate::bridge`]; scripted fakes live in
//! [`crate::testing`].

use async_trait::async_trait;
use courier_protocol::{AuthStrategy, AutomationOptions, Conversation, MediaPayload, SendMediaOptions};
use courier_runtime::EventReceiver;
use tracing::debug;

use crate::error::Result;

/// The messaging client hosted by the driver.
#[async_trait]
pub trait MessagingClient: Send {
	/// Hands out the lifecycle event stream; `None` after the first call.
	fn take_events(&mut self) -> Option<EventReceiver>;

	/// Starts the client. May not resolve until authentication progresses, so
	/// callers poll it alongside the event stream.
	async fn initialize(&mut self, auth: &AuthStrategy, automation: &AutomationOptions) -> Result<()>;

	async fn list_conversations(&mut self) -> Result<Vec<Conversation>>;

	/// Shows the transient "composing" indicator in `chat_id`.
	async fn send_typing_state(&mut self, chat_id: &str) -> Result<()>;

	/// Clears any transient indicator in `chat_id`.
	async fn clear_state(&mut self, chat_id: &str) -> Result<()>;

	async fn send_media(&mut self, chat_id: &str, media: MediaPayload, options: SendMediaOptions) -> Result<()>;

	async fn destroy(&mut self) -> Result<()>;
}

/// The durable store holding serialized session state.
#[async_trait]
pub trait SessionStore: Send {
	async fn connect(&mut self, connection_string: &str) -> Result<()>;

	async fn disconnect(&mut self) -> Result<()>;
}

/// Side channel that shows a scan code to the operator.
pub trait QrRenderer: Send {
	fn render(&mut self, code: &str);
}

/// Tears down the client, then the store. Failures are logged and dropped;
/// the process is ending either way.
pub async fn release(client: &mut dyn MessagingClient, store: Option<&mut dyn SessionStore>) {
	if let Err(err) = client.destroy().await {
		debug!(target = "courier", error = %err, "client release failed");
	}
	if let Some(store) = store {
		if let Err(err) = store.disconnect().await {
			debug!(target = "courier", error = %err, "store release failed");
		}
	}
}
