//! Conversation snapshot entries.

use serde::{Deserialize, Serialize};

/// One entry of the conversation list returned by `client.listConversations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
	/// Display name; empty for chats the remote side never named.
	#[serde(default)]
	pub name: String,
	/// Stable serialized identifier (e.g. `123456789@g.us`).
	pub id: String,
}

impl Conversation {
	pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			id: id.into(),
		}
	}
}
