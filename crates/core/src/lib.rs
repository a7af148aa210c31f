//! Session bootstrap and file delivery for a messaging client hosted by an
//! external driver.
//!
//! A session is bootstrapped once ([`BootstrapCoordinator`]), optionally backed
//! up to a durable store, and then reused by short-lived delivery runs
//! ([`DeliveryCoordinator`]) that send a single file to one conversation.
//!
//! # Example
//!
//! ```ignore
//! let config = CourierConfig::discover(None, &std::env::current_dir()?)?;
//! let connection_string = config.connection_string()?;
//! let bridge = Bridge::launch(&config.driver_command())?;
//! let mut client = bridge.client();
//! let mut store = bridge.store();
//!
//! let report = BootstrapCoordinator::new(config.bootstrap_options(connection_string), TerminalQrRenderer::stdout())
//!     .run(&mut client, Some(&mut store))
//!     .await?;
//! ```

pub mod bootstrap;
pub mod bridge;
pub mod collaborator;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod render;
pub mod state;
pub mod testing;

pub use bootstrap::{BootstrapCoordinator, BootstrapOptions, BootstrapReport};
pub use bridge::{Bridge, BridgeClient, BridgeStore};
pub use collaborator::{MessagingClient, QrRenderer, SessionStore};
pub use config::{CourierConfig, PersistenceMode, Timings};
pub use delivery::{DeliveryCoordinator, DeliveryOptions, DeliveryReport, DeliveryRequest, DeliveryTarget, Payload};
pub use error::{Error, Result};
pub use export::{SessionExport, export_session};
pub use render::TerminalQrRenderer;
pub use state::{Completion, ReadinessTracker, SessionState};
