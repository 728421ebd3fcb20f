//! # Waitline
//!
//! A keyed event-wait registry: suspend a task until a future inbound
//! event matching a (subject, event-kind) pair arrives, with filters,
//! timeouts, and cancellation.
//!
//! ## Core Concepts
//!
//! - **Waits**: single-resolution suspensions keyed by (subject, kind);
//!   at most one pending wait per key
//! - **Filters**: async-capable predicates deciding whether a candidate
//!   event satisfies a wait
//! - **Router**: host-side dispatch that resolves waiters and then routes
//!   events through the normal handler chain
//! - **Janitor**: settled records leave the store automatically, on every
//!   settlement path
//!
//! ## Example
//!
//! ```ignore
//! use waitline::{EventKind, EventRouter, SubjectId, WaitOptions, filter_fn};
//!
//! let router = Arc::new(EventRouter::<Update>::new());
//! router.set_extractor(EventKind::Message, |u: &Update| Some(SubjectId(u.chat)));
//!
//! // Ask a question, then suspend until the subject replies "yes" or "no".
//! send_prompt(chat, "Proceed?").await?;
//! let reply = router
//!     .wait_for(
//!         SubjectId(chat),
//!         EventKind::Message,
//!         WaitOptions::timeout(Duration::from_secs(30))
//!             .with_filter(filter_fn(|_, u| u.text == "yes" || u.text == "no")),
//!     )
//!     .await?;
//!
//! // Meanwhile the host's delivery loop feeds every inbound event:
//! router.dispatch(EventKind::Message, update).await?;
//! ```

pub mod dispatch;
pub mod error;
pub mod types;
pub mod waiters;

// Re-exports
pub use dispatch::{DispatchOutcome, EventHandler, EventRouter, SubjectExtractor, SubjectResolver};
pub use error::{Result, WaitError};
pub use types::{EventKind, SubjectId, SubjectRef, WaitId};
pub use waiters::{filter_fn, try_filter_fn, EventFilter, WaitOptions, WaiterRegistry};
