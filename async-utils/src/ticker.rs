use std::time::Duration;

use tokio::time::Instant;
use tokio::time::Interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::CancelErr;

/// Repeating timer that stops for good once its token is cancelled.
///
/// The first tick fires one full period after construction, not immediately,
/// so a freshly started poller waits one interval before its first request.
/// A tick that is late because the previous request was slow is not made up
/// for with a burst; the schedule simply shifts.
#[derive(Debug)]
pub struct PollTicker {
    interval: Interval,
    token: CancellationToken,
}

impl PollTicker {
    pub fn new(period: Duration, token: CancellationToken) -> Self {
        // tokio panics on a zero period.
        let period = period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, token }
    }

    /// Wait for the next tick, or fail with [`CancelErr::Cancelled`] once the
    /// token fires. Cancellation always wins over a tick that is ready at the
    /// same instant.
    pub async fn tick(&mut self) -> Result<(), CancelErr> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(CancelErr::Cancelled),
            _ = self.interval.tick() => Ok(()),
        }
    }
}
