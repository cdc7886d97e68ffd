use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// One step of a running [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Seconds left after this tick.
    pub remaining: u32,
    /// `true` exactly once, on the tick that reaches zero.
    pub expired: bool,
}

/// A stoppable, resettable countdown that decrements once per period.
pub struct Countdown {
    period: Duration,
    initial: u32,
    remaining: u32,
    /// Deadline of the next tick. `None` while stopped.
    next_tick: Option<Instant>,
}

impl Countdown {
    /// Creates a stopped countdown of `secs` seconds.
    pub fn new(secs: u32) -> Self {
        Self::with_period(secs, Duration::from_secs(1))
    }

    /// Creates a stopped countdown with a custom tick period.
    pub fn with_period(secs: u32, period: Duration) -> Self {
        Self {
            period,
            initial: secs,
            remaining: secs,
            next_tick: None,
        }
    }

    /// Stops the countdown and refills it, to `secs` if given or to the
    /// last duration used otherwise.
    pub fn reset(&mut self, secs: Option<u32>) {
        if let Some(secs) = secs {
            self.initial = secs;
        }
        self.remaining = self.initial;
        self.next_tick = None;
        debug!(remaining = self.remaining, "countdown reset");
    }

    /// Starts ticking. No-op if already running or nothing is left.
    pub fn start(&mut self) {
        if self.next_tick.is_some() || self.remaining == 0 {
            return;
        }
        self.next_tick = Some(Instant::now() + self.period);
        debug!(remaining = self.remaining, "countdown started");
    }

    /// Stops ticking and keeps the remaining time. Idempotent.
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(remaining = self.remaining, "countdown stopped");
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns `true` while ticking.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Waits for the next tick.
    ///
    /// Pends forever while stopped. The tick that takes the countdown to
    /// zero stops it and reports `expired`.
    pub async fn tick(&mut self) -> Tick {
        let Some(deadline) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;

        if self.remaining <= 1 {
            self.remaining = 0;
            self.next_tick = None;
            debug!("countdown expired");
            return Tick {
                remaining: 0,
                expired: true,
            };
        }

        self.remaining -= 1;
        self.next_tick = Some(deadline + self.period);
        trace!(remaining = self.remaining, "countdown tick");
        Tick {
            remaining: self.remaining,
            expired: false,
        }
    }
}
