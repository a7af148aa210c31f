//! Driver lifecycle, transport, and request/response correlation for courier.
//!
//! The messaging client runs inside an external driver process. This crate
//! spawns it, frames its stdio as newline-delimited JSON, and exposes a
//! [`Connection`] that correlates command responses and fans lifecycle events
//! out to a single subscriber.

pub mod connection;
pub mod error;
pub mod fake_transport;
pub mod process;
pub mod transport;

pub use connection::{Connection, EventReceiver};
pub use error::{Error, Result};
pub use process::{DriverCommand, DriverProcess};
pub use transport::{PipeTransport, Transport, TransportParts, TransportReceiver};
