//! Command parameter types sent to the driver.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// How the driver keeps the authenticated session between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthStrategy {
	/// Session files stay in a local data directory.
	#[serde(rename_all = "camelCase")]
	Local { client_id: Option<String>, data_path: String },
	/// Session is backed up to the durable store connected via `store.connect`.
	#[serde(rename_all = "camelCase")]
	Remote {
		client_id: Option<String>,
		data_path: String,
		backup_sync_interval_ms: u64,
	},
}

/// Options forwarded to the browser automation layer inside the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationOptions {
	pub headless: bool,
	#[serde(default)]
	pub args: Vec<String>,
	pub protocol_timeout_ms: u64,
}

impl Default for AutomationOptions {
	fn default() -> Self {
		Self {
			headless: true,
			args: vec!["--no-sandbox".to_string(), "--disable-setuid-sandbox".to_string()],
			protocol_timeout_ms: 60_000,
		}
	}
}

/// File contents attached to an outgoing media message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPayload {
	pub mimetype: String,
	/// Base64-encoded file body.
	pub data: String,
	pub filename: Option<String>,
}

impl MediaPayload {
	/// Encodes raw file bytes for transfer.
	pub fn from_bytes(mimetype: impl Into<String>, filename: Option<String>, bytes: &[u8]) -> Self {
		Self {
			mimetype: mimetype.into(),
			data: STANDARD.encode(bytes),
			filename,
		}
	}

	/// Length of the decoded body in bytes.
	pub fn decoded_len(&self) -> usize {
		self.data.len() / 4 * 3 - self.data.bytes().rev().take_while(|b| *b == b'=').count()
	}
}

/// Per-message send options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaOptions {
	#[serde(default)]
	pub caption: String,
	/// Whether sending marks the conversation as read.
	pub send_seen: bool,
}

impl SendMediaOptions {
	/// Caption-only options that leave the conversation unread.
	pub fn unseen(caption: impl Into<String>) -> Self {
		Self {
			caption: caption.into(),
			send_seen: false,
		}
	}
}
