//! Waiter registry for keyed single-resolution waits.
//!
//! This module lets a task suspend until a future inbound event matching a
//! (subject, event kind) pair arrives:
//! - At most one pending wait per key; a new registration pre-empts the old
//! - Optional async-capable filter predicates gating resolution
//! - Timeout and cancellation as first-class settlement paths
//! - Settled records are removed from the store automatically
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(WaiterRegistry::<Update>::new());
//!
//! // Somewhere in a task: suspend until subject 42 sends a message.
//! let options = WaitOptions::timeout(Duration::from_secs(30))
//!     .with_filter(filter_fn(|_, update| update.text.starts_with("yes")));
//! let update = registry
//!     .register_wait(SubjectId(42), EventKind::Message, options)
//!     .await?;
//!
//! // In the event-delivery path: offer each inbound event.
//! let resolved = registry.on_event(subject, kind, &update).await?;
//! ```

mod registry;
mod types;

pub use registry::WaiterRegistry;
pub use types::{filter_fn, try_filter_fn, EventFilter, WaitOptions};
