use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed activity interval reported by the peripheral.
///
/// Events are immutable once constructed; the codec never mutates them. The
/// wire format truncates timestamps to whole seconds, so a round trip through
/// [`crate::codec`] reproduces `begin`/`end` at 1-second precision and
/// `session_id` exactly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    session_id: i64,
}

impl Event {
    /// Construct an event covering `begin..end` for the given session.
    ///
    /// `end` is semantically expected to be at or after `begin`; ordering is
    /// owned by the service side and not enforced here.
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>, session_id: i64) -> Self {
        Self {
            begin,
            end,
            session_id,
        }
    }

    /// UTC timestamp at which the activity began.
    pub fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    /// UTC timestamp at which the activity ended.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Session identifier, `0` when the service reported none.
    pub fn session_id(&self) -> i64 {
        self.session_id
    }
}

/// Bit-set of independent service conditions.
///
/// Bit assignments are wire-stable: a flag keeps its position forever and new
/// flags take unused positions. Unknown bits coming from a newer service are
/// preserved rather than rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct StatusFlags(u32);

impl StatusFlags {
    /// Service is running (bit 0).
    pub const RUNNING: StatusFlags = StatusFlags(1 << 0);
    /// Bluetooth is disabled on the service side (bit 1).
    pub const BLUETOOTH_DISABLED: StatusFlags = StatusFlags(1 << 1);

    /// Wrap a raw bit pattern, keeping unknown bits intact.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit pattern, including any bits this version does not know about.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit in `flags` is set.
    pub const fn contains(self, flags: StatusFlags) -> bool {
        self.0 & flags.0 == flags.0
    }

    /// Union of both flag sets.
    pub const fn union(self, flags: StatusFlags) -> Self {
        Self(self.0 | flags.0)
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Link lifecycle state of the connection to the companion service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LinkState {
    /// No binding exists.
    Unbound,
    /// A bind request was issued and the connection is being established.
    Binding,
    /// The remote handle is live and proxied operations may be issued.
    Connected,
}

/// Notification delivered to the application through the delivery channel.
///
/// Variants arrive in the order the dispatcher received them; for one
/// incoming events-changed notification the raw variant is always queued
/// before the decoded one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientEvent {
    /// The connection is established and proxied calls may be issued.
    Ready,
    /// The connection is gone; any retained handle is no longer valid.
    Destroyed,
    /// Full current event list as wire strings, verbatim.
    EventsChangedRaw {
        /// Wire-encoded event records.
        events: Vec<String>,
    },
    /// Full current event list decoded via the codec.
    ///
    /// Entries that failed to decode are skipped; see [`crate::codec`].
    EventsChanged {
        /// Decoded event records.
        events: Vec<Event>,
    },
    /// A peripheral was seen while no address is bound.
    NewPeripheral {
        /// Hardware address of the discovered peripheral.
        address: String,
    },
    /// Low-power condition signaled by the peripheral.
    Brownout {
        /// `true` when the battery is empty and needs replacement.
        battery_empty: bool,
    },
    /// Service status flags changed.
    StatusChanged {
        /// Current flag set, unknown bits preserved.
        status: StatusFlags,
    },
}
