//! In-memory transport for testing correlation and event dispatch without a driver.
//!
//! # Example
//!
//! ```ignore
//! let (parts, mut controller) = FakeTransportBuilder::new().build();
//! let connection = Arc::new(Connection::new(parts));
//!
//! tokio::spawn({
//!     let conn = Arc::clone(&connection);
//!     async move { conn.run().await }
//! });
//!
//! let fut = connection.send_message("client.destroy", json!({}));
//! controller.inject_response(0, json!(null));
//! fut.await?;
//! ```

use std::future::Future;
use std::pin::Pin;

use courier_protocol::ClientEvent;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::Result;
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Builder for fake transport instances.
#[derive(Default)]
pub struct FakeTransportBuilder {}

impl FakeTransportBuilder {
	pub fn new() -> Self {
		Self {}
	}

	/// Returns transport parts for a [`Connection`](crate::Connection) and a
	/// controller that plays the driver's side.
	pub fn build(self) -> (TransportParts, FakeTransportController) {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let (sent_tx, sent_rx) = mpsc::unbounded_channel();

		let parts = TransportParts {
			sender: Box::new(FakeTransportSender { sent: sent_tx }),
			receiver: Box::new(FakeTransportReceiver { inbound_rx, message_tx }),
			message_rx,
		};

		let controller = FakeTransportController {
			inbound_tx: Some(inbound_tx),
			sent: sent_rx,
		};

		(parts, controller)
	}
}

/// Driver-side handle: inject replies/events and inspect requests.
pub struct FakeTransportController {
	inbound_tx: Option<mpsc::UnboundedSender<Value>>,
	sent: mpsc::UnboundedReceiver<Value>,
}

impl FakeTransportController {
	/// Injects a raw driver line.
	pub fn inject(&self, message: Value) {
		if let Some(tx) = &self.inbound_tx {
			let _ = tx.send(message);
		}
	}

	pub fn inject_response(&self, id: u32, result: Value) {
		self.inject(serde_json::json!({ "id": id, "result": result }));
	}

	pub fn inject_error(&self, id: u32, name: &str, message: &str) {
		self.inject(serde_json::json!({
			"id": id,
			"error": { "message": message, "name": name }
		}));
	}

	pub fn inject_event(&self, event: ClientEvent) {
		self.inject(serde_json::json!({ "event": event }));
	}

	/// Simulates the driver process exiting.
	pub fn close(&mut self) {
		self.inbound_tx = None;
	}

	/// Waits for the next request written by the connection.
	pub async fn next_sent(&mut self) -> Option<Value> {
		self.sent.recv().await
	}

	/// Drains every request written so far.
	pub fn take_sent(&mut self) -> Vec<Value> {
		let mut sent = Vec::new();
		while let Ok(message) = self.sent.try_recv() {
			sent.push(message);
		}
		sent
	}
}

struct FakeTransportSender {
	sent: mpsc::UnboundedSender<Value>,
}

impl Transport for FakeTransportSender {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		let _ = self.sent.send(message);
		Box::pin(async { Ok(()) })
	}
}

struct FakeTransportReceiver {
	inbound_rx: mpsc::UnboundedReceiver<Value>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for FakeTransportReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			while let Some(message) = self.inbound_rx.recv().await {
				if self.message_tx.send(message).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}
