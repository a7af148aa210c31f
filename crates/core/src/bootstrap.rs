//! One-time session bootstrap.
//!
//! Connects the durable store (remote mode), starts the client, shows every
//! scan code the client issues, and waits until the session is safe to reuse:
//! `ready` alone in local mode, `ready` plus `session_persisted` in remote
//! mode. The persistence confirmation is not guaranteed to arrive, so once the
//! client is ready a bounded grace timer runs; on expiry the run completes
//! degraded instead of hanging.

use std::time::Duration;

use courier_protocol::{AuthStrategy, AutomationOptions, ClientEvent};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::collaborator::{MessagingClient, QrRenderer, SessionStore, release};
use crate::config::PersistenceMode;
use crate::error::{Error, Result};
use crate::state::{Completion, ReadinessTracker, SessionState, Verdict};

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
	pub persistence: PersistenceMode,
	/// Required in remote mode.
	pub connection_string: Option<String>,
	pub auth: AuthStrategy,
	pub automation: AutomationOptions,
	/// Bounded wait for `session_persisted` after `ready`.
	pub grace: Duration,
	/// Pause before release after a local-only completion.
	pub local_flush: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
	pub completion: Completion,
	pub qr_renders: usize,
	pub final_state: SessionState,
}

pub struct BootstrapCoordinator<R> {
	options: BootstrapOptions,
	tracker: ReadinessTracker,
	renderer: R,
	qr_renders: usize,
}

impl<R: QrRenderer> BootstrapCoordinator<R> {
	pub fn new(options: BootstrapOptions, renderer: R) -> Self {
		let tracker = ReadinessTracker::new(options.persistence);
		Self {
			options,
			tracker,
			renderer,
			qr_renders: 0,
		}
	}

	pub fn tracker(&self) -> &ReadinessTracker {
		&self.tracker
	}

	pub fn renderer(&self) -> &R {
		&self.renderer
	}

	/// Applies one lifecycle event. Scan codes are rendered every time they
	/// arrive; the rest feed the readiness tracker.
	pub fn handle_event(&mut self, event: ClientEvent) -> Verdict {
		match event {
			ClientEvent::Loading { percent, message } => {
				info!(target = "courier.bootstrap", percent, %message, "loading");
				Verdict::Pending
			}
			ClientEvent::QrIssued { code } => {
				self.qr_renders += 1;
				info!(target = "courier.bootstrap", renders = self.qr_renders, "scan code issued");
				self.renderer.render(&code);
				self.tracker.on_qr_issued()
			}
			ClientEvent::Authenticated => {
				info!(target = "courier.bootstrap", "authenticated");
				self.tracker.on_authenticated()
			}
			ClientEvent::AuthFailed { reason } => self.tracker.on_auth_failed(reason),
			ClientEvent::Ready => {
				info!(target = "courier.bootstrap", "client ready");
				self.tracker.on_ready()
			}
			ClientEvent::SessionPersisted => {
				info!(target = "courier.bootstrap", "session persisted to store");
				self.tracker.on_persisted()
			}
			ClientEvent::Disconnected { reason } => self.tracker.on_disconnected(reason),
		}
	}

	/// Runs the bootstrap to a terminal verdict and releases the client and
	/// store on every path past store acquisition.
	pub async fn run(mut self, client: &mut dyn MessagingClient, mut store: Option<&mut dyn SessionStore>) -> Result<BootstrapReport> {
		if self.options.persistence == PersistenceMode::Remote {
			let uri = self
				.options
				.connection_string
				.clone()
				.ok_or_else(|| Error::Configuration("remote persistence needs a connection string".into()))?;
			let Some(store) = store.as_deref_mut() else {
				return Err(Error::Configuration("remote persistence needs a session store".into()));
			};
			store.connect(&uri).await.map_err(into_connection_error)?;
			debug!(target = "courier.bootstrap", "store connected");
		}

		let outcome = self.drive(client).await;

		if let Ok(Completion::LocalOnly) = outcome {
			debug!(target = "courier.bootstrap", flush = ?self.options.local_flush, "letting session files settle");
			tokio::time::sleep(self.options.local_flush).await;
		}
		release(client, store).await;

		let completion = outcome?;
		Ok(BootstrapReport {
			completion,
			qr_renders: self.qr_renders,
			final_state: self.tracker.state(),
		})
	}

	async fn drive(&mut self, client: &mut dyn MessagingClient) -> Result<Completion> {
		let mut events = client
			.take_events()
			.ok_or_else(|| Error::Transport("client event stream already taken".into()))?;

		let auth = self.options.auth.clone();
		let automation = self.options.automation.clone();
		let init = client.initialize(&auth, &automation);
		tokio::pin!(init);
		let mut init_done = false;

		let grace = tokio::time::sleep(self.options.grace);
		tokio::pin!(grace);
		let mut grace_armed = false;

		loop {
			tokio::select! {
				biased;

				event = events.recv() => {
					let Some(event) = event else {
						return Err(Error::Transport("event stream closed before the session was ready".into()));
					};
					match self.handle_event(event) {
						Verdict::Complete(completion) => return Ok(completion),
						Verdict::Failed(reason) => return Err(reason.into()),
						Verdict::Pending => {}
					}
					if !grace_armed && self.tracker.awaiting_persistence() {
						grace.as_mut().reset(Instant::now() + self.options.grace);
						grace_armed = true;
						info!(target = "courier.bootstrap", grace = ?self.options.grace, "waiting for session persistence");
					}
				}
				result = &mut init, if !init_done => {
					init_done = true;
					result?;
					debug!(target = "courier.bootstrap", "client initialize returned");
				}
				() = &mut grace, if grace_armed => {
					grace_armed = false;
					if let Verdict::Complete(completion) = self.tracker.on_grace_expired() {
						warn!(
							target = "courier.bootstrap",
							degraded_completion = true,
							grace = ?self.options.grace,
							"session persistence was not confirmed in time; continuing"
						);
						return Ok(completion);
					}
				}
			}
		}
	}
}

pub(crate) fn into_connection_error(err: Error) -> Error {
	match err {
		Error::Connection(_) => err,
		other => Error::Connection(other.to_string()),
	}
}
