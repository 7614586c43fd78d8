//! Cancellation helpers shared by the diff pollers.
//!
//! Two pieces live here:
//! - [`OrCancelExt`] lets a single request future lose a race against a
//!   [`CancellationToken`], so a retargeted session abandons in-flight I/O.
//! - [`PollTicker`] is the cancelable fixed-interval timer that paces the
//!   structure and node pollers.

mod ticker;

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

pub use ticker::PollTicker;

/// Returned when the token fired before the guarded work finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelErr {
    Cancelled,
}

impl fmt::Display for CancelErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for CancelErr {}

#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Resolve to `Ok(output)` if the future wins, or `Err(CancelErr::Cancelled)`
    /// if `token` is (or already was) cancelled first. The losing future is dropped.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, CancelErr>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, CancelErr> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(CancelErr::Cancelled),
            res = self => Ok(res),
        }
    }
}
