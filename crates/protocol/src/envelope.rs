//! Line envelopes exchanged with the driver.
//!
//! Every line on the driver's stdio is one JSON document:
//!
//! ```json
//! {"id": 3, "method": "client.listConversations", "params": {}}
//! {"id": 3, "result": [{"name": "Family", "id": "a@g.us"}]}
//! {"id": 4, "error": {"message": "chat not found", "name": "ProtocolError"}}
//! {"event": {"kind": "ready"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::ClientEvent;

/// Command sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request ID for correlating responses.
	pub id: u32,
	/// Dotted method name (e.g. `client.sendMedia`).
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u32,
	/// Success result (mutually exclusive with error).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Driver-side failure details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	/// Error class name (e.g. `TimeoutError`, `TargetClosedError`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// Unsolicited lifecycle notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
	pub event: ClientEvent,
}

/// Anything the driver may write.
///
/// Responses are distinguished from events by the presence of `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Response(Response),
	Event(EventMessage),
}

/// Method names understood by the driver.
pub mod methods {
	pub const STORE_CONNECT: &str = "store.connect";
	pub const STORE_DISCONNECT: &str = "store.disconnect";
	pub const CLIENT_INITIALIZE: &str = "client.initialize";
	pub const CLIENT_LIST_CONVERSATIONS: &str = "client.listConversations";
	pub const CLIENT_SEND_TYPING: &str = "client.sendTyping";
	pub const CLIENT_CLEAR_STATE: &str = "client.clearState";
	pub const CLIENT_SEND_MEDIA: &str = "client.sendMedia";
	pub const CLIENT_DESTROY: &str = "client.destroy";
}
