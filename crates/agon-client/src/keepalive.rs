//! Keep-alive pings.
//!
//! A hosted backend that sees no traffic for a while gets suspended and then
//! pays a long cold start on the next request. While the front end is in the
//! foreground this loop pings the liveness endpoint on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use agon_core::LivenessProbe;

/// Default ping interval, a little under the usual 15 minute idle cutoff.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(12 * 60);

/// Shortest interval accepted; anything below is raised to this.
pub const MIN_PING_INTERVAL: Duration = Duration::from_secs(1);

/// A running keep-alive loop. Dropping the handle stops it.
#[derive(Debug)]
pub struct KeepAlive {
    handle: JoinHandle<()>,
}

impl KeepAlive {
    /// Start pinging through `probe`.
    ///
    /// `visible` reports whether the front end is in the foreground. Each
    /// time it turns true a ping is sent at once and the interval restarts;
    /// while it is false nothing is sent. The loop ends when the visibility
    /// sender is dropped. An `interval` under [`MIN_PING_INTERVAL`] is
    /// raised to it.
    pub fn spawn(
        probe: Arc<dyn LivenessProbe>,
        visible: watch::Receiver<bool>,
        interval: Duration,
    ) -> Self {
        if interval < MIN_PING_INTERVAL {
            warn!(?interval, "Keep-alive interval too short, using {:?}", MIN_PING_INTERVAL);
        }
        let interval = interval.max(MIN_PING_INTERVAL);
        let handle = tokio::spawn(run(probe, visible, interval));
        Self { handle }
    }

    /// True once the loop has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the loop.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(probe: Arc<dyn LivenessProbe>, mut visible: watch::Receiver<bool>, interval: Duration) {
    loop {
        while !*visible.borrow_and_update() {
            if visible.changed().await.is_err() {
                return;
            }
        }

        debug!("Foreground, starting keep-alive pings");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *visible.borrow() {
                        ping(probe.as_ref()).await;
                    }
                }
                changed = visible.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*visible.borrow_and_update() {
                        debug!("Background, pausing keep-alive pings");
                        break;
                    }
                }
            }
        }
    }
}

async fn ping(probe: &dyn LivenessProbe) {
    match probe.ping().await {
        Ok(()) => trace!("Keep-alive ping ok"),
        Err(e) => debug!(error = %e, "Keep-alive ping failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use agon_core::Result;
    use agon_core::error::{Error, TransportError};

    #[derive(Default)]
    struct CountingProbe {
        pings: AtomicUsize,
        fail: bool,
    }

    impl CountingProbe {
        fn count(&self) -> usize {
            self.pings.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LivenessProbe for CountingProbe {
        async fn ping(&self) -> Result<()> {
            self.pings.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Transport(TransportError::Timeout))
            } else {
                Ok(())
            }
        }
    }

    const INTERVAL: Duration = Duration::from_secs(60);

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn pings_immediately_then_on_interval() {
        let probe = Arc::new(CountingProbe::default());
        let (_tx, rx) = watch::channel(true);
        let _keep_alive = KeepAlive::spawn(probe.clone(), rx, INTERVAL);

        settle().await;
        assert_eq!(probe.count(), 1);

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(probe.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_page_is_not_pinged() {
        let probe = Arc::new(CountingProbe::default());
        let (tx, rx) = watch::channel(false);
        let _keep_alive = KeepAlive::spawn(probe.clone(), rx, INTERVAL);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(probe.count(), 0);

        tx.send(true).unwrap();
        settle().await;
        assert_eq!(probe.count(), 1);

        tx.send(false).unwrap();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(probe.count(), 1);

        tx.send(true).unwrap();
        settle().await;
        assert_eq!(probe.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let probe = Arc::new(CountingProbe {
            pings: AtomicUsize::new(0),
            fail: true,
        });
        let (_tx, rx) = watch::channel(true);
        let _keep_alive = KeepAlive::spawn(probe.clone(), rx, INTERVAL);

        tokio::time::sleep(Duration::from_secs(130)).await;
        assert_eq!(probe.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_raised_to_minimum() {
        let probe = Arc::new(CountingProbe::default());
        let (_tx, rx) = watch::channel(true);
        let keep_alive = KeepAlive::spawn(probe.clone(), rx, Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(!keep_alive.is_finished());
        assert_eq!(probe.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn ends_when_visibility_sender_drops() {
        let probe = Arc::new(CountingProbe::default());
        let (tx, rx) = watch::channel(true);
        let keep_alive = KeepAlive::spawn(probe.clone(), rx, INTERVAL);

        settle().await;
        drop(tx);
        settle().await;

        assert!(keep_alive.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_aborts_the_loop() {
        let probe = Arc::new(CountingProbe::default());
        let (_tx, rx) = watch::channel(true);
        let keep_alive = KeepAlive::spawn(probe.clone(), rx, INTERVAL);

        settle().await;
        keep_alive.stop();
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(probe.count(), 1);
    }
}
