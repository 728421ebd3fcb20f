//! Core types for the wait registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a subject (the conversational entity an event is
/// associated with).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub i64);

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        SubjectId(id)
    }
}

/// Higher-level reference to a subject.
///
/// References must be resolved to a [`SubjectId`] before use as a registry
/// key; symbolic names require a host-supplied resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRef {
    /// Already-numeric subject id.
    Id(i64),
    /// Symbolic name known to the host (e.g. a username).
    Name(String),
}

impl From<i64> for SubjectRef {
    fn from(id: i64) -> Self {
        SubjectRef::Id(id)
    }
}

impl From<SubjectId> for SubjectRef {
    fn from(id: SubjectId) -> Self {
        SubjectRef::Id(id.0)
    }
}

impl From<&str> for SubjectRef {
    fn from(name: &str) -> Self {
        SubjectRef::Name(name.to_string())
    }
}

/// Category of inbound event a wait can be registered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An ordinary message.
    Message,
    /// A callback query (e.g. an inline button press).
    Callback,
    /// An inline query.
    InlineQuery,
    /// A chosen inline result.
    ChosenInlineResult,
    /// A user presence/status change.
    UserStatus,
    /// A raw, unclassified update.
    RawUpdate,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 6] = [
        EventKind::Message,
        EventKind::Callback,
        EventKind::InlineQuery,
        EventKind::ChosenInlineResult,
        EventKind::UserStatus,
        EventKind::RawUpdate,
    ];

    /// Stable lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::Callback => "callback",
            EventKind::InlineQuery => "inline_query",
            EventKind::ChosenInlineResult => "chosen_inline_result",
            EventKind::UserStatus => "user_status",
            EventKind::RawUpdate => "raw_update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity tag for a pending-wait record.
///
/// Allocated from a monotonically increasing counter; lets the janitor
/// distinguish a record from a newer one that overwrote it at the same key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitId(pub u64);

impl fmt::Debug for WaitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaitId({})", self.0)
    }
}
