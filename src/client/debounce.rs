//! Debounces a stream of input values (search boxes).
//!
//! Each pushed value restarts the quiet timer; only the last value of a burst
//! is emitted, once no new value arrived for the configured delay. Dropping
//! the [`Debouncer`] abandons any pending value.

use std::time::Duration;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::sleep,
};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Debouncer<T> {
    input: UnboundedSender<T>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the timer task; settled values arrive on the returned receiver.
    #[must_use]
    pub fn new(delay: Duration) -> (Self, UnboundedReceiver<T>) {
        let (input, pending) = mpsc::unbounded_channel();
        let (settled, output) = mpsc::unbounded_channel();
        let worker = tokio::spawn(settle(delay, pending, settled));
        (Self { input, worker }, output)
    }

    #[must_use]
    pub fn with_default_delay() -> (Self, UnboundedReceiver<T>) {
        Self::new(DEFAULT_DELAY)
    }

    /// Supersedes any pending value. Returns `false` once the consumer is gone.
    pub fn push(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn settle<T>(delay: Duration, mut pending: UnboundedReceiver<T>, settled: UnboundedSender<T>) {
    while let Some(mut latest) = pending.recv().await {
        loop {
            tokio::select! {
                next = pending.recv() => match next {
                    Some(value) => latest = value,
                    None => return,
                },
                () = sleep(delay) => {
                    if settled.send(latest).is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn emits_last_value_after_quiet_period() {
        let (debouncer, mut settled) = Debouncer::with_default_delay();

        assert!(debouncer.push("g"));
        sleep(Duration::from_millis(200)).await;
        assert!(debouncer.push("go"));
        sleep(Duration::from_millis(200)).await;
        assert!(debouncer.push("gold"));
        let last_keystroke = Instant::now();

        assert_eq!(settled.recv().await, Some("gold"));
        assert!(last_keystroke.elapsed() >= DEFAULT_DELAY);
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_emit_separately() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(100));

        debouncer.push(1);
        debouncer.push(2);
        assert_eq!(settled.recv().await, Some(2));

        debouncer.push(3);
        assert_eq!(settled.recv().await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_emitted_before_the_delay() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));
        debouncer.push("a");
        sleep(Duration::from_millis(499)).await;
        assert!(settled.try_recv().is_err());
        sleep(Duration::from_millis(2)).await;
        assert_eq!(settled.try_recv().ok(), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_abandons_pending_value() {
        let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(100));
        debouncer.push("abandoned");
        drop(debouncer);
        assert_eq!(settled.recv().await, None);
    }
}
