//! Request/response correlation and event fan-out over a driver transport.
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send_message`] with a method and params
//! 2. Connection allocates a sequential ID and parks a oneshot sender
//! 3. The request is written through the transport
//! 4. The dispatch loop ([`Connection::run`]) reads driver lines
//! 5. Responses complete the parked oneshot; events go to the event channel
//!
//! When the transport closes, every pending request fails with
//! [`Error::ChannelClosed`] and the event channel is closed, so a subscriber
//! waiting on events observes end-of-stream instead of hanging.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use courier_protocol::{ClientEvent, ErrorPayload, Message, Request};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Receiving end of the lifecycle event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

pub struct Connection {
	last_id: AtomicU32,
	callbacks: Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>,
	sender: Mutex<Box<dyn Transport>>,
	receiver: parking_lot::Mutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	events_tx: parking_lot::Mutex<Option<mpsc::UnboundedSender<ClientEvent>>>,
	events_rx: parking_lot::Mutex<Option<EventReceiver>>,
}

impl Connection {
	pub fn new(parts: TransportParts) -> Self {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		Self {
			last_id: AtomicU32::new(0),
			callbacks: Mutex::new(HashMap::new()),
			sender: Mutex::new(parts.sender),
			receiver: parking_lot::Mutex::new(Some(parts.receiver)),
			message_rx: Mutex::new(Some(parts.message_rx)),
			events_tx: parking_lot::Mutex::new(Some(events_tx)),
			events_rx: parking_lot::Mutex::new(Some(events_rx)),
		}
	}

	/// Hands out the event stream. Only the first caller gets it.
	pub fn take_events(&self) -> Option<EventReceiver> {
		self.events_rx.lock().take()
	}

	/// Sends a command and waits for the driver's reply.
	pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id, tx);

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};
		trace!(target = "courier.driver", id, method, "sending request");

		let request_value = serde_json::to_value(&request)?;
		if let Err(err) = self.sender.lock().await.send(request_value).await {
			self.callbacks.lock().await.remove(&id);
			return Err(err);
		}

		rx.await.map_err(|_| Error::ChannelClosed).and_then(|result| result)
	}

	/// Runs the dispatch loop until the transport closes.
	///
	/// Spawn this once in a background task.
	pub async fn run(&self) {
		let Some(receiver) = self.receiver.lock().take() else {
			error!(target = "courier.driver", "connection loop already started");
			return;
		};
		let Some(mut message_rx) = self.message_rx.lock().await.take() else {
			error!(target = "courier.driver", "connection loop already started");
			return;
		};

		let transport_handle = tokio::spawn(async move {
			if let Err(err) = receiver.run().await {
				error!(target = "courier.driver", error = %err, "transport error");
			}
		});

		while let Some(message_value) = message_rx.recv().await {
			match serde_json::from_value::<Message>(message_value.clone()) {
				Ok(message) => {
					if let Err(err) = self.dispatch(message).await {
						error!(target = "courier.driver", error = %err, "failed to dispatch message");
					}
				}
				Err(err) => {
					error!(target = "courier.driver", error = %err, message = %message_value, "unrecognized driver message");
				}
			}
		}

		debug!(target = "courier.driver", "message loop ended (transport closed)");
		self.close_pending().await;
		let _ = transport_handle.await;
	}

	async fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self
					.callbacks
					.lock()
					.await
					.remove(&response.id)
					.ok_or_else(|| Error::Protocol(format!("Cannot find request to respond: id={}", response.id)))?;

				let result = match response.error {
					Some(payload) => Err(parse_driver_error(payload)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				// Receiver may have been dropped by an abandoned caller.
				let _ = callback.send(result);
				Ok(())
			}
			Message::Event(message) => {
				debug!(target = "courier.driver", event = %message.event, "driver event");
				if let Some(tx) = self.events_tx.lock().as_ref() {
					let _ = tx.send(message.event);
				}
				Ok(())
			}
		}
	}

	async fn close_pending(&self) {
		self.events_tx.lock().take();
		let pending: Vec<_> = self.callbacks.lock().await.drain().collect();
		for (_, callback) in pending {
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}
}

fn parse_driver_error(error: ErrorPayload) -> Error {
	match error.name.as_deref() {
		Some("TimeoutError") => Error::Timeout(error.message),
		Some("TargetClosedError") => Error::TargetClosed(error.message),
		_ => Error::Protocol(error.message),
	}
}
