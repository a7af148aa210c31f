//! Newline-delimited JSON framing over the driver's stdio.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::Result;

/// Outbound half of a transport.
pub trait Transport: Send {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Inbound half of a transport; pumps parsed messages until the peer closes.
pub trait TransportReceiver: Send {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Everything a [`Connection`](crate::Connection) needs from a transport.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Transport over a pair of pipes, one JSON document per line.
pub struct PipeTransport;

impl PipeTransport {
	/// Splits a writer/reader pair into [`TransportParts`].
	pub fn new<W, R>(stdin: W, stdout: R) -> TransportParts
	where
		W: AsyncWrite + Unpin + Send + 'static,
		R: AsyncRead + Unpin + Send + 'static,
	{
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		TransportParts {
			sender: Box::new(PipeSender { stdin }),
			receiver: Box::new(PipeReceiver { stdout, message_tx }),
			message_rx,
		}
	}
}

struct PipeSender<W> {
	stdin: W,
}

impl<W> Transport for PipeSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			let mut line = serde_json::to_vec(&message)?;
			line.push(b'\n');
			self.stdin.write_all(&line).await?;
			self.stdin.flush().await?;
			Ok(())
		})
	}
}

struct PipeReceiver<R> {
	stdout: R,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<R> TransportReceiver for PipeReceiver<R>
where
	R: AsyncRead + Unpin + Send + 'static,
{
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			let PipeReceiver { stdout, message_tx } = *self;
			let mut lines = BufReader::new(stdout).lines();
			while let Some(line) = lines.next_line().await? {
				let line = line.trim();
				if line.is_empty() {
					continue;
				}
				// The driver's own console output shares stdout.
				let Ok(value) = serde_json::from_str::<Value>(line) else {
					tracing::debug!(target = "courier.driver", %line, "non-protocol output");
					continue;
				};
				if message_tx.send(value).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use tokio::io::{AsyncReadExt, duplex};

	#[tokio::test]
	async fn sender_writes_one_line_per_message() {
		let (mut driver_side, client_side) = duplex(1024);
		let mut parts = PipeTransport::new(client_side, tokio::io::empty());

		parts.sender.send(json!({"id": 0, "method": "client.destroy"})).await.unwrap();
		drop(parts.sender);

		let mut written = String::new();
		driver_side.read_to_string(&mut written).await.unwrap();
		assert_eq!(written, "{\"id\":0,\"method\":\"client.destroy\"}\n");
	}

	#[tokio::test]
	async fn receiver_skips_non_json_lines() {
		let input: &[u8] = b"booting chromium...\n{\"event\":{\"kind\":\"ready\"}}\n\n";
		let mut parts = PipeTransport::new(tokio::io::sink(), input);

		parts.receiver.run().await.unwrap();

		let first = parts.message_rx.recv().await.unwrap();
		assert_eq!(first["event"]["kind"], "ready");
		assert!(parts.message_rx.recv().await.is_none());
	}
}
