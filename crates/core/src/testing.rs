//! Scripted collaborators for exercising the coordinators without a driver.
//!
//! Every call lands in a shared [`CallLog`] stamped with the tokio clock, so
//! tests running on a paused clock can assert both ordering and elapsed time.

use std::sync::Arc;

use async_trait::async_trait;
use courier_protocol::{AuthStrategy, AutomationOptions, ClientEvent, Conversation, MediaPayload, SendMediaOptions};
use courier_runtime::EventReceiver;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::collaborator::{MessagingClient, QrRenderer, SessionStore};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	StoreConnect(String),
	StoreDisconnect,
	Initialize,
	ListConversations,
	SendTyping(String),
	ClearState(String),
	SendMedia {
		chat_id: String,
		filename: Option<String>,
		caption: String,
		send_seen: bool,
	},
	Destroy,
}

#[derive(Debug, Clone)]
pub struct CallRecord {
	pub call: Call,
	pub at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<CallRecord>>>);

impl CallLog {
	pub fn new() -> Self {
		Self::default()
	}

	fn push(&self, call: Call) {
		self.0.lock().push(CallRecord { call, at: Instant::now() });
	}

	pub fn calls(&self) -> Vec<Call> {
		self.0.lock().iter().map(|record| record.call.clone()).collect()
	}

	pub fn records(&self) -> Vec<CallRecord> {
		self.0.lock().clone()
	}

	/// First record matching `pred`.
	pub fn find(&self, pred: impl Fn(&Call) -> bool) -> Option<CallRecord> {
		self.0.lock().iter().find(|record| pred(&record.call)).cloned()
	}

	pub fn contains(&self, pred: impl Fn(&Call) -> bool) -> bool {
		self.find(pred).is_some()
	}
}

/// Which client command should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
	Initialize,
	ListConversations,
	SendTyping,
	ClearState,
	SendMedia,
	Destroy,
}

pub struct FakeClient {
	events_tx: Option<mpsc::UnboundedSender<ClientEvent>>,
	events_rx: Option<EventReceiver>,
	on_initialize: Vec<ClientEvent>,
	hang_on_initialize: bool,
	close_after_initialize: bool,
	conversations: Vec<Conversation>,
	fail: Option<FailPoint>,
	log: CallLog,
}

impl FakeClient {
	pub fn new(log: CallLog) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			events_tx: Some(tx),
			events_rx: Some(rx),
			on_initialize: Vec::new(),
			hang_on_initialize: false,
			close_after_initialize: false,
			conversations: Vec::new(),
			fail: None,
			log,
		}
	}

	/// Events emitted, in order, as soon as `initialize` is called.
	pub fn emit_on_initialize(mut self, events: impl IntoIterator<Item = ClientEvent>) -> Self {
		self.on_initialize.extend(events);
		self
	}

	pub fn with_conversations(mut self, conversations: impl IntoIterator<Item = Conversation>) -> Self {
		self.conversations.extend(conversations);
		self
	}

	/// `initialize` never returns, like a client parked on a scan code.
	pub fn hang_on_initialize(mut self) -> Self {
		self.hang_on_initialize = true;
		self
	}

	/// Drops the event sender after the scripted events, ending the stream.
	pub fn close_after_initialize(mut self) -> Self {
		self.close_after_initialize = true;
		self
	}

	pub fn fail(mut self, point: FailPoint) -> Self {
		self.fail = Some(point);
		self
	}

	/// Sender for injecting events from a test task.
	pub fn event_sender(&self) -> Option<mpsc::UnboundedSender<ClientEvent>> {
		self.events_tx.clone()
	}

	pub fn log(&self) -> CallLog {
		self.log.clone()
	}

	fn check(&self, point: FailPoint) -> Result<()> {
		if self.fail == Some(point) {
			return Err(Error::Transport(format!("scripted failure at {point:?}")));
		}
		Ok(())
	}
}

#[async_trait]
impl MessagingClient for FakeClient {
	fn take_events(&mut self) -> Option<EventReceiver> {
		self.events_rx.take()
	}

	async fn initialize(&mut self, _auth: &AuthStrategy, _automation: &AutomationOptions) -> Result<()> {
		self.log.push(Call::Initialize);
		if let Some(tx) = &self.events_tx {
			for event in self.on_initialize.drain(..) {
				let _ = tx.send(event);
			}
		}
		if self.close_after_initialize {
			self.events_tx = None;
		}
		self.check(FailPoint::Initialize)?;
		if self.hang_on_initialize {
			std::future::pending::<()>().await;
		}
		Ok(())
	}

	async fn list_conversations(&mut self) -> Result<Vec<Conversation>> {
		self.log.push(Call::ListConversations);
		self.check(FailPoint::ListConversations)?;
		Ok(self.conversations.clone())
	}

	async fn send_typing_state(&mut self, chat_id: &str) -> Result<()> {
		self.log.push(Call::SendTyping(chat_id.to_string()));
		self.check(FailPoint::SendTyping)
	}

	async fn clear_state(&mut self, chat_id: &str) -> Result<()> {
		self.log.push(Call::ClearState(chat_id.to_string()));
		self.check(FailPoint::ClearState)
	}

	async fn send_media(&mut self, chat_id: &str, media: MediaPayload, options: SendMediaOptions) -> Result<()> {
		self.log.push(Call::SendMedia {
			chat_id: chat_id.to_string(),
			filename: media.filename,
			caption: options.caption,
			send_seen: options.send_seen,
		});
		self.check(FailPoint::SendMedia)
	}

	async fn destroy(&mut self) -> Result<()> {
		self.log.push(Call::Destroy);
		self.check(FailPoint::Destroy)
	}
}

pub struct FakeStore {
	log: CallLog,
	refuse: Option<String>,
}

impl FakeStore {
	pub fn new(log: CallLog) -> Self {
		Self { log, refuse: None }
	}

	/// A store whose `connect` always fails with `reason`.
	pub fn refusing(log: CallLog, reason: impl Into<String>) -> Self {
		Self {
			log,
			refuse: Some(reason.into()),
		}
	}
}

#[async_trait]
impl SessionStore for FakeStore {
	async fn connect(&mut self, connection_string: &str) -> Result<()> {
		self.log.push(Call::StoreConnect(connection_string.to_string()));
		match &self.refuse {
			Some(reason) => Err(Error::Connection(reason.clone())),
			None => Ok(()),
		}
	}

	async fn disconnect(&mut self) -> Result<()> {
		self.log.push(Call::StoreDisconnect);
		Ok(())
	}
}

/// Renderer that only remembers what it was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
	codes: Arc<Mutex<Vec<String>>>,
}

impl RecordingRenderer {
	pub fn codes(&self) -> Vec<String> {
		self.codes.lock().clone()
	}
}

impl QrRenderer for RecordingRenderer {
	fn render(&mut self, code: &str) {
		self.codes.lock().push(code.to_string());
	}
}
