use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::live::{LiveElapsed, live_elapsed};

/// One repeating one-second timer for one visible event card.
///
/// Each card owns exactly one `Ticker`; dropping it aborts the timer task,
/// so a torn-down card cannot leak its interval.
pub struct Ticker {
    rx: watch::Receiver<LiveElapsed>,
    task: JoinHandle<()>,
}

impl Ticker {
    pub fn start(start: DateTime<Utc>) -> Self {
        let (tx, rx) = watch::channel(live_elapsed(&start, &Utc::now()));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                if tx.send(live_elapsed(&start, &Utc::now())).is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    /// Watch the counter; the value refreshes once per second.
    pub fn subscribe(&self) -> watch::Receiver<LiveElapsed> {
        self.rx.clone()
    }

    pub fn latest(&self) -> LiveElapsed {
        *self.rx.borrow()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_ticker_reads_zero_days() {
        let ticker = Ticker::start(Utc::now());
        assert_eq!(ticker.latest().total_days, 0);
    }

    #[tokio::test]
    async fn dropping_the_ticker_stops_the_timer() {
        let ticker = Ticker::start(Utc::now());
        let mut rx = ticker.subscribe();
        drop(ticker);
        // Once the task is aborted the sender is gone; changed() must
        // eventually error instead of ticking forever.
        while rx.changed().await.is_ok() {}
    }
}
