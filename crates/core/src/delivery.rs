//! Single-payload delivery over a previously bootstrapped session.
//!
//! # Sequence
//!
//! 1. Connect the durable store (remote mode)
//! 2. Start the client and wait for `ready`; a scan code here means the stored
//!    session was rejected
//! 3. Take one conversation snapshot and resolve the recipient against it
//! 4. Load the payload; nothing is sent if the file is missing
//! 5. Warm up the conversation with a composing signal held for the dwell
//! 6. Send the payload as one media message without marking the chat seen
//! 7. Hold the settle window so the outbound queue flushes, then release
//!
//! Any failure aborts the remaining steps. Resources acquired so far are
//! released before the error is returned; nothing is retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use courier_protocol::{AuthStrategy, AutomationOptions, ClientEvent, Conversation, MediaPayload, SendMediaOptions};
use tracing::{debug, info};

use crate::bootstrap::into_connection_error;
use crate::collaborator::{MessagingClient, SessionStore, release};
use crate::config::PersistenceMode;
use crate::error::{Error, Result};

/// How many conversation names a failed lookup reports.
pub const DIAGNOSTIC_CANDIDATES: usize = 10;

#[derive(Debug, Clone)]
pub struct DeliveryOptions {
	pub persistence: PersistenceMode,
	pub connection_string: Option<String>,
	pub auth: AuthStrategy,
	pub automation: AutomationOptions,
	/// Composing-signal hold before the send; zero skips the warm-up.
	pub warmup_dwell: Duration,
	/// Post-send flush window.
	pub settle: Duration,
}

/// A local file plus its caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
	path: PathBuf,
	caption: String,
}

impl Payload {
	pub fn new(path: impl Into<PathBuf>, caption: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			caption: caption.into(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn caption(&self) -> &str {
		&self.caption
	}

	/// Fails with [`Error::Resource`] unless the path is a readable regular file.
	pub fn validate(&self) -> Result<()> {
		if self.path.is_file() {
			Ok(())
		} else {
			Err(Error::Resource { path: self.path.clone() })
		}
	}

	/// Reads the file and encodes it for the driver, guessing the MIME type
	/// from the extension.
	pub async fn to_media(&self) -> Result<MediaPayload> {
		let bytes = tokio::fs::read(&self.path).await.map_err(|err| match err.kind() {
			std::io::ErrorKind::NotFound => Error::Resource { path: self.path.clone() },
			_ => Error::Io(err),
		})?;
		let mimetype = mime_guess::from_path(&self.path).first_or_octet_stream();
		let filename = self.path.file_name().map(|name| name.to_string_lossy().into_owned());
		Ok(MediaPayload::from_bytes(mimetype.essence_str(), filename, &bytes))
	}
}

/// A conversation resolved from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
	pub name: String,
	pub id: String,
	pub resolved_at: DateTime<Utc>,
}

/// Proof that the composing signal was shown for the full dwell and cleared.
#[derive(Debug)]
pub struct WarmupToken {
	chat_id: String,
	dwell: Duration,
}

impl WarmupToken {
	pub fn chat_id(&self) -> &str {
		&self.chat_id
	}

	pub fn dwell(&self) -> Duration {
		self.dwell
	}
}

/// Exact display-name match first, then exact identifier match. Among equal
/// names the first in snapshot order wins. A blank recipient never matches,
/// since unnamed conversations carry an empty name.
pub fn resolve_target(snapshot: &[Conversation], recipient: &str) -> Option<DeliveryTarget> {
	if recipient.trim().is_empty() {
		return None;
	}
	snapshot
		.iter()
		.find(|conversation| conversation.name == recipient)
		.or_else(|| snapshot.iter().find(|conversation| conversation.id == recipient))
		.map(|conversation| DeliveryTarget {
			name: conversation.name.clone(),
			id: conversation.id.clone(),
			resolved_at: Utc::now(),
		})
}

/// The first `limit` conversation labels, for operator diagnosis. Unnamed
/// conversations are listed by identifier.
pub fn candidate_names(snapshot: &[Conversation], limit: usize) -> Vec<String> {
	snapshot
		.iter()
		.take(limit)
		.map(|conversation| {
			if conversation.name.is_empty() {
				conversation.id.clone()
			} else {
				conversation.name.clone()
			}
		})
		.collect()
}

#[derive(Debug, Clone)]
pub struct DeliveryRequest {
	pub recipient: String,
	pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
	pub target: DeliveryTarget,
	pub warmed_up: bool,
	pub bytes_sent: usize,
}

pub struct DeliveryCoordinator {
	options: DeliveryOptions,
}

impl DeliveryCoordinator {
	pub fn new(options: DeliveryOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &DeliveryOptions {
		&self.options
	}

	pub async fn run(
		&self,
		client: &mut dyn MessagingClient,
		mut store: Option<&mut dyn SessionStore>,
		request: &DeliveryRequest,
	) -> Result<DeliveryReport> {
		self.acquire_store(store.as_mut().map(|store| &mut **store as &mut dyn SessionStore)).await?;
		let outcome = self.deliver(client, request).await;
		release(client, store).await;
		outcome
	}

	async fn acquire_store(&self, store: Option<&mut dyn SessionStore>) -> Result<()> {
		if self.options.persistence != PersistenceMode::Remote {
			return Ok(());
		}
		let uri = self
			.options
			.connection_string
			.as_deref()
			.ok_or_else(|| Error::Configuration("remote persistence needs a connection string".into()))?;
		let store = store.ok_or_else(|| Error::Configuration("remote persistence needs a session store".into()))?;
		store.connect(uri).await.map_err(into_connection_error)?;
		debug!(target = "courier.delivery", "store connected");
		Ok(())
	}

	async fn deliver(&self, client: &mut dyn MessagingClient, request: &DeliveryRequest) -> Result<DeliveryReport> {
		self.await_ready(client).await?;

		let snapshot = client.list_conversations().await?;
		debug!(target = "courier.delivery", conversations = snapshot.len(), "conversation snapshot taken");
		let target = resolve_target(&snapshot, &request.recipient).ok_or_else(|| Error::Resolution {
			recipient: request.recipient.clone(),
			candidates: candidate_names(&snapshot, DIAGNOSTIC_CANDIDATES),
		})?;
		info!(target = "courier.delivery", name = %target.name, id = %target.id, "recipient resolved");

		request.payload.validate()?;
		let media = request.payload.to_media().await?;
		let bytes_sent = media.decoded_len();

		let token = self.warm_up(client, &target).await?;
		if let Some(token) = &token {
			debug!(target = "courier.delivery", chat = token.chat_id(), dwell = ?token.dwell(), "warm-up complete");
		}

		client
			.send_media(&target.id, media, SendMediaOptions::unseen(request.payload.caption()))
			.await?;
		info!(target = "courier.delivery", id = %target.id, bytes = bytes_sent, "payload sent");

		debug!(target = "courier.delivery", settle = ?self.options.settle, "waiting for outbound queue to flush");
		tokio::time::sleep(self.options.settle).await;

		Ok(DeliveryReport {
			target,
			warmed_up: token.is_some(),
			bytes_sent,
		})
	}

	/// Starts the client and waits for the first decisive lifecycle event.
	async fn await_ready(&self, client: &mut dyn MessagingClient) -> Result<()> {
		let mut events = client
			.take_events()
			.ok_or_else(|| Error::Transport("client event stream already taken".into()))?;

		let auth = self.options.auth.clone();
		let automation = self.options.automation.clone();
		let init = client.initialize(&auth, &automation);
		tokio::pin!(init);
		let mut init_done = false;

		loop {
			tokio::select! {
				biased;

				event = events.recv() => match event {
					Some(ClientEvent::Ready) => {
						info!(target = "courier.delivery", "client ready");
						return Ok(());
					}
					Some(ClientEvent::QrIssued { .. }) => {
						return Err(Error::Authentication("stored session was rejected and a new scan was requested".into()));
					}
					Some(ClientEvent::AuthFailed { reason }) => return Err(Error::Authentication(reason)),
					Some(ClientEvent::Disconnected { reason }) => {
						return Err(Error::Transport(format!("client disconnected: {reason}")));
					}
					Some(other) => debug!(target = "courier.delivery", event = %other, "lifecycle event"),
					None => return Err(Error::Transport("event stream closed before the client was ready".into())),
				},
				result = &mut init, if !init_done => {
					init_done = true;
					result?;
				}
			}
		}
	}

	async fn warm_up(&self, client: &mut dyn MessagingClient, target: &DeliveryTarget) -> Result<Option<WarmupToken>> {
		let dwell = self.options.warmup_dwell;
		if dwell.is_zero() {
			return Ok(None);
		}
		client.send_typing_state(&target.id).await?;
		tokio::time::sleep(dwell).await;
		client.clear_state(&target.id).await?;
		Ok(Some(WarmupToken {
			chat_id: target.id.clone(),
			dwell,
		}))
	}
}
