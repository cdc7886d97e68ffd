use std::time::Duration;

use tokio::time::{self, Instant};

/// A cancellable one-shot timer carrying a value.
///
/// Scheduling while a value is pending replaces it, so at most one
/// delayed action exists at a time.
pub struct Delay<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Delay<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Delay<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the delay. Returns the value it replaced, if any.
    pub fn schedule(&mut self, after: Duration, value: T) -> Option<T> {
        self.pending
            .replace((Instant::now() + after, value))
            .map(|(_, old)| old)
    }

    /// Disarms the delay. Returns the value that will now never fire.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves with the scheduled value once its deadline passes.
    ///
    /// Pends forever while nothing is scheduled.
    pub async fn fired(&mut self) -> T {
        loop {
            let Some((deadline, _)) = &self.pending else {
                std::future::pending::<()>().await;
                continue;
            };
            time::sleep_until(*deadline).await;
            if let Some((_, value)) = self.pending.take() {
                return value;
            }
        }
    }
}
