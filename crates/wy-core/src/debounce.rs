//! Trailing-edge debouncer
//!
//! Coalesces bursts of triggers into a single run of an action. Each trigger
//! pushes the deadline out by the quiescence interval; the action runs once
//! the interval passes with no further triggers.
//!
//! The action is spawned as its own task, so a run that is still in flight
//! never blocks later triggers and is never aborted by them.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Handle used to trigger a debounced action
///
/// Cloning yields another trigger for the same action. Dropping every handle
/// cancels a pending (not yet started) run.
#[derive(Debug, Clone)]
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    interval: Duration,
}

impl Debouncer {
    /// Wrap `action` behind a quiescence `interval`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<F, Fut>(interval: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(schedule(rx, interval, action));
        Self { tx, interval }
    }

    /// Request a run; resets any pending deadline
    ///
    /// Returns immediately; the action never runs on the caller's stack.
    #[inline]
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("debouncer scheduler stopped, trigger dropped");
        }
    }

    /// Quiescence interval
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

async fn schedule<F, Fut>(mut rx: mpsc::UnboundedReceiver<()>, interval: Duration, action: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    while rx.recv().await.is_some() {
        let deadline = tokio::time::sleep(interval);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(()) => deadline.as_mut().reset(Instant::now() + interval),
                    None => return,
                },
                () = &mut deadline => break,
            }
        }

        tokio::spawn(action());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const INTERVAL: Duration = Duration::from_millis(300);

    fn counting() -> (Arc<AtomicUsize>, Debouncer) {
        let count = Arc::new(AtomicUsize::new(0));
        let fired = Arc::clone(&count);
        let debouncer = Debouncer::new(INTERVAL, move || {
            let fired = Arc::clone(&fired);
            async move {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        (count, debouncer)
    }

    #[tokio::test(start_paused = true)]
    async fn single_trigger_fires_after_interval() {
        let (count, debouncer) = counting();

        debouncer.trigger();
        assert_eq!(count.load(Ordering::SeqCst), 0, "never fires synchronously");

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_after_last_trigger() {
        let (count, debouncer) = counting();

        for _ in 0..5 {
            debouncer.trigger();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // 100ms since the last trigger
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(51)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_fire_separately() {
        let (count, debouncer) = counting();

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.trigger();
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_pending_run() {
        let (count, debouncer) = counting();

        debouncer.trigger();
        drop(debouncer);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_action_does_not_block_next_burst() {
        let started = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&started);
        let debouncer = Debouncer::new(INTERVAL, move || {
            let started = Arc::clone(&observed);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
        });

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(350)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    proptest! {
        #[test]
        fn prop_burst_below_interval_fires_exactly_once(
            gaps in proptest::collection::vec(0u64..299, 1..20)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let fired = runtime.block_on(async move {
                let (count, debouncer) = counting();
                for gap in gaps {
                    debouncer.trigger();
                    tokio::time::sleep(Duration::from_millis(gap)).await;
                    assert_eq!(count.load(Ordering::SeqCst), 0);
                }
                debouncer.trigger();
                tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
                count.load(Ordering::SeqCst)
            });

            prop_assert_eq!(fired, 1);
        }
    }
}
