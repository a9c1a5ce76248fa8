//! Trailing-edge debouncing for rapidly edited inputs.

use std::future::pending;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Default quiet period for the like-filter slider
pub const DEFAULT_LIKE_FILTER_DEBOUNCE: Duration = Duration::from_millis(500);

/// Holds the latest value of an input until it has been left alone for the
/// quiet period.
///
/// [`Debouncer::settled`] is cancel-safe, so it can sit in a `tokio::select!`
/// loop next to the branch that calls [`Debouncer::push`].
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new value, restarting the quiet period.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.quiet));
    }

    /// Drop the pending value, if any.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Peek at the value waiting to settle.
    #[must_use]
    pub fn pending_value(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    /// Wait until the pending value has been quiet long enough and return it.
    /// Never resolves while nothing is pending.
    pub async fn settled(&mut self) -> T {
        loop {
            let Some(&(_, deadline)) = self.pending.as_ref() else {
                return pending().await;
            };
            sleep_until(deadline).await;
            if let Some((value, _)) = self.pending.take() {
                return value;
            }
        }
    }
}
