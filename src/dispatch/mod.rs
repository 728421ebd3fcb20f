//! Host-side dispatch glue around the waiter registry.
//!
//! One generic [`EventRouter`] replaces per-kind handler plumbing: the host
//! classifies each inbound event by [`EventKind`](crate::EventKind),
//! installs a subject extractor per kind, and calls
//! [`EventRouter::dispatch`]. The router consults the registry first and
//! then routes through the handler chain either way.

mod router;

pub use router::{
    DispatchOutcome, EventHandler, EventRouter, SubjectExtractor, SubjectResolver,
};
