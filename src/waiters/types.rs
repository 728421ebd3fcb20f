//! Wait configuration and filter types.

use crate::error::Result;
use crate::types::SubjectId;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether a candidate event satisfies a pending wait.
///
/// Filters may suspend (e.g. to consult external state). Returning
/// `Ok(false)` leaves the wait pending; an error settles the wait with that
/// error and propagates it to the dispatching caller as well.
#[async_trait]
pub trait EventFilter<E>: Send + Sync {
    /// Whether `event` satisfies the wait registered for `subject`.
    async fn check(&self, subject: SubjectId, event: &E) -> Result<bool>;
}

struct FnFilter<F>(F);

#[async_trait]
impl<E, F> EventFilter<E> for FnFilter<F>
where
    E: Sync,
    F: Fn(SubjectId, &E) -> bool + Send + Sync,
{
    async fn check(&self, subject: SubjectId, event: &E) -> Result<bool> {
        Ok((self.0)(subject, event))
    }
}

struct TryFnFilter<F>(F);

#[async_trait]
impl<E, F> EventFilter<E> for TryFnFilter<F>
where
    E: Sync,
    F: Fn(SubjectId, &E) -> Result<bool> + Send + Sync,
{
    async fn check(&self, subject: SubjectId, event: &E) -> Result<bool> {
        (self.0)(subject, event)
    }
}

/// Wrap an infallible closure as a filter.
pub fn filter_fn<E, F>(f: F) -> Arc<dyn EventFilter<E>>
where
    E: Send + Sync + 'static,
    F: Fn(SubjectId, &E) -> bool + Send + Sync + 'static,
{
    Arc::new(FnFilter(f))
}

/// Wrap a fallible closure as a filter.
pub fn try_filter_fn<E, F>(f: F) -> Arc<dyn EventFilter<E>>
where
    E: Send + Sync + 'static,
    F: Fn(SubjectId, &E) -> Result<bool> + Send + Sync + 'static,
{
    Arc::new(TryFnFilter(f))
}

/// Configuration for a single wait.
pub struct WaitOptions<E> {
    /// Give up after this long (None = wait indefinitely).
    pub timeout: Option<Duration>,

    /// Filter criteria (None = first event of the kind wins).
    pub filter: Option<Arc<dyn EventFilter<E>>>,
}

impl<E> WaitOptions<E> {
    /// Wait for the first event of the kind, unfiltered and unbounded.
    pub fn new() -> Self {
        Self {
            timeout: None,
            filter: None,
        }
    }

    /// Wait bounded by `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            filter: None,
        }
    }

    /// Attach a filter predicate.
    pub fn with_filter(mut self, filter: Arc<dyn EventFilter<E>>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attach a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<E> Default for WaitOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for WaitOptions<E> {
    fn clone(&self) -> Self {
        Self {
            timeout: self.timeout,
            filter: self.filter.clone(),
        }
    }
}

impl<E> fmt::Debug for WaitOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitOptions")
            .field("timeout", &self.timeout)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filter_fn_passes_arguments() {
        let filter = filter_fn(|subject: SubjectId, event: &String| {
            subject == SubjectId(9) && event == "yes"
        });
        assert!(filter.check(SubjectId(9), &"yes".to_string()).await.unwrap());
        assert!(!filter.check(SubjectId(9), &"no".to_string()).await.unwrap());
        assert!(!filter.check(SubjectId(1), &"yes".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_try_filter_fn_propagates_error() {
        use crate::error::WaitError;

        let filter = try_filter_fn(|_subject: SubjectId, _event: &String| {
            Err(WaitError::Filter("bad predicate".to_string()))
        });
        let err = filter
            .check(SubjectId(1), &"x".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, WaitError::Filter("bad predicate".to_string()));
    }

    #[test]
    fn test_options_builders() {
        let opts: WaitOptions<String> =
            WaitOptions::timeout(Duration::from_secs(5)).with_filter(filter_fn(|_, _| true));
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert!(opts.filter.is_some());

        let debug = format!("{opts:?}");
        assert!(debug.contains("has_filter: true"));
    }
}
