//! The single deadline- and cancellation-aware wait used by the poll loop.
//!
//! Every suspension inside an execution (remote calls and deliberate pauses
//! alike) goes through [`bounded`], so the absolute deadline holds even when
//! the remote side is slow, and a cancelled caller stops the loop at the next
//! suspension point.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

/// Why a bounded wait ended without its future completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Deadline,
    Cancelled,
}

/// Race `future` against `deadline` (if any) and `cancel`.
///
/// Cancellation wins over the deadline and the deadline wins over a future
/// that becomes ready at the same time, so a deadline that has already passed
/// is reported without polling `future` at all.
pub async fn bounded<F>(deadline: Option<Instant>, cancel: &CancellationToken, future: F) -> Result<F::Output, Interrupted>
where
    F: Future,
{
    let expiry = async {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        _ = expiry => Err(Interrupted::Deadline),
        output = future => Ok(output),
    }
}

/// Sleep for `duration`, cut short by the deadline or cancellation.
pub async fn pause(deadline: Option<Instant>, cancel: &CancellationToken, duration: Duration) -> Result<(), Interrupted> {
    bounded(deadline, cancel, sleep(duration)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_cuts_a_longer_pause() {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(1);
        let outcome = pause(Some(deadline), &CancellationToken::new(), Duration::from_secs(30)).await;
        assert_eq!(outcome, Err(Interrupted::Deadline));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn passed_deadline_never_polls_the_future() {
        let polled = std::sync::atomic::AtomicBool::new(false);
        let deadline = Instant::now();
        let outcome = bounded(Some(deadline), &CancellationToken::new(), async {
            polled.store(true, std::sync::atomic::Ordering::SeqCst);
            1
        })
        .await;
        assert_eq!(outcome, Err(Interrupted::Deadline));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = bounded(None, &cancel, async { 7 }).await;
        assert_eq!(outcome, Err(Interrupted::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn completes_before_deadline() {
        let deadline = Instant::now() + Duration::from_secs(10);
        let outcome = bounded(Some(deadline), &CancellationToken::new(), async {
            sleep(Duration::from_secs(2)).await;
            "done"
        })
        .await;
        assert_eq!(outcome, Ok("done"));
    }
}
