//! Wire types for the courier driver bridge.
//!
//! This crate contains the serde-serializable types exchanged with the
//! messaging-client driver over newline-delimited JSON. These types represent
//! the "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with the bridge: Match the commands and events the driver speaks
//! * Stable: Changes only when the wire protocol changes
//!
//! The coordinators that interpret these types live in `courier-rs`.

pub mod conversation;
pub mod envelope;
pub mod event;
pub mod options;

pub use conversation::*;
pub use envelope::*;
pub use event::*;
pub use options::*;
