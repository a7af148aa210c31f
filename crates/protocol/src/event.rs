//! Lifecycle events emitted by the messaging client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A lifecycle signal from the messaging-client collaborator.
///
/// The driver emits these in whatever order the remote side produces them;
/// in particular `Ready` and `SessionPersisted` have no guaranteed relative
/// order, and `SessionPersisted` may never arrive at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientEvent {
	/// Informational progress while the client boots.
	Loading {
		#[serde(default)]
		percent: u8,
		#[serde(default)]
		message: String,
	},
	/// A scan code must be presented to a second device.
	QrIssued { code: String },
	/// Credentials were accepted by the remote side.
	Authenticated,
	/// Credentials were rejected by the remote side.
	AuthFailed {
		#[serde(default)]
		reason: String,
	},
	/// The client is fully usable.
	Ready,
	/// The durable store confirmed the session was saved.
	SessionPersisted,
	/// The client lost its connection to the remote side.
	Disconnected {
		#[serde(default)]
		reason: String,
	},
}

impl ClientEvent {
	/// Stable snake_case name used in logs.
	pub fn name(&self) -> &'static str {
		match self {
			ClientEvent::Loading { .. } => "loading",
			ClientEvent::QrIssued { .. } => "qr_issued",
			ClientEvent::Authenticated => "authenticated",
			ClientEvent::AuthFailed { .. } => "auth_failed",
			ClientEvent::Ready => "ready",
			ClientEvent::SessionPersisted => "session_persisted",
			ClientEvent::Disconnected { .. } => "disconnected",
		}
	}
}

impl fmt::Display for ClientEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
