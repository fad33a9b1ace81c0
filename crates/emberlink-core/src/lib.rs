//! Core contract shared between the Emberlink client and its consumers.
//!
//! This crate defines the event wire codec, the status flag set, the link
//! lifecycle model, and the common error/channel abstractions.

/// Single-consumer delivery channel and application-facing callbacks.
pub mod channel;
/// Wire codec for event records exchanged with the companion service.
pub mod codec;
/// Stable client error types.
pub mod error;
/// Link lifecycle state machine.
pub mod link;
/// Client-facing protocol types (events, status flags, notifications).
pub mod types;

pub use channel::{ClientCallbacks, DeliverySender, EventReceiver, delivery_channel, dispatch_to};
pub use codec::{decode_event, decode_events, encode_event, encode_events};
pub use error::{ClientError, DecodeError, RemoteError};
pub use link::{BindDecision, LinkStateMachine};
pub use types::{ClientEvent, Event, LinkState, StatusFlags};
