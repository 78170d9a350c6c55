use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{
    self,
    error::{TryRecvError, TrySendError},
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use venue_core::{NotificationDispatcher, NotificationSink};
use venue_shared::BookingSummary;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before attempt n+1 is `backoff * n`, capped at `max_backoff`
    pub backoff: Duration,
    pub max_backoff: Duration,
    /// A stuck delivery is escalated to `error!` every this many failures
    pub alert_after: u32,
}

impl RetryPolicy {
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        self.backoff.saturating_mul(failed_attempts).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            alert_after: 10,
        }
    }
}

/// Messages that did not fit in the channel. Drained by the worker once the
/// channel runs dry.
#[derive(Default)]
struct Spill {
    pending: Mutex<VecDeque<BookingSummary>>,
    pushed: Notify,
}

impl Spill {
    fn pending(&self) -> MutexGuard<'_, VecDeque<BookingSummary>> {
        // Only push/pop happen under the lock, so a poisoned queue is still intact
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, summary: BookingSummary) {
        self.pending().push_back(summary);
        self.pushed.notify_one();
    }

    fn pop(&self) -> Option<BookingSummary> {
        self.pending().pop_front()
    }
}

/// Producer half handed to the orchestrator. Enqueueing never waits: when the
/// channel is full the message spills into an unbounded side queue that the
/// worker drains, so nothing is dropped while the worker is alive.
#[derive(Clone)]
pub struct QueuedNotifier {
    tx: mpsc::Sender<BookingSummary>,
    spill: Arc<Spill>,
}

impl QueuedNotifier {
    pub fn channel(capacity: usize) -> (Self, NotificationQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let spill = Arc::new(Spill::default());
        (
            Self {
                tx,
                spill: spill.clone(),
            },
            NotificationQueue { rx, spill },
        )
    }
}

impl NotificationDispatcher for QueuedNotifier {
    fn enqueue_booking_confirmation(&self, summary: BookingSummary) {
        match self.tx.try_send(summary) {
            Ok(()) => debug!("Queued booking confirmation"),
            Err(TrySendError::Full(summary)) => {
                warn!("Notification queue full, spilling confirmation for {}", summary.booking_reference);
                self.spill.push(summary);
            }
            Err(TrySendError::Closed(summary)) => {
                error!(
                    "Notification worker stopped, confirmation for {} cannot be delivered",
                    summary.booking_reference
                )
            }
        }
    }
}

/// Consumer half: the channel plus its spill queue
pub struct NotificationQueue {
    rx: mpsc::Receiver<BookingSummary>,
    spill: Arc<Spill>,
}

impl NotificationQueue {
    /// Next message to deliver. `None` once every `QueuedNotifier` is gone and
    /// both the channel and the spill queue are empty.
    pub async fn next(&mut self) -> Option<BookingSummary> {
        loop {
            match self.rx.try_recv() {
                Ok(summary) => return Some(summary),
                Err(TryRecvError::Disconnected) => return self.spill.pop(),
                Err(TryRecvError::Empty) => {}
            }
            if let Some(summary) = self.spill.pop() {
                return Some(summary);
            }

            tokio::select! {
                received = self.rx.recv() => {
                    return match received {
                        Some(summary) => Some(summary),
                        None => self.spill.pop(),
                    };
                }
                // A producer spilled after we looked; go round again
                _ = self.spill.pushed.notified() => {}
            }
        }
    }
}

/// Drains the queue into a sink. Each message is retried until the sink
/// accepts it, so delivery is at-least-once for as long as the worker runs.
/// Order is preserved unless the queue spilled.
pub struct NotificationWorker {
    queue: NotificationQueue,
    sink: Arc<dyn NotificationSink>,
    policy: RetryPolicy,
}

impl NotificationWorker {
    pub fn new(queue: NotificationQueue, sink: Arc<dyn NotificationSink>, policy: RetryPolicy) -> Self {
        Self { queue, sink, policy }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until every `QueuedNotifier` is dropped and the queue is empty
    pub async fn run(mut self) {
        info!("Notification worker started");
        while let Some(summary) = self.queue.next().await {
            self.deliver_with_retry(&summary).await;
        }
        info!("Notification worker stopped");
    }

    /// Returns the number of attempts it took
    async fn deliver_with_retry(&self, summary: &BookingSummary) -> u32 {
        let alert_after = self.policy.alert_after.max(1);
        let mut attempt: u32 = 1;
        loop {
            match self.sink.deliver(summary).await {
                Ok(()) => {
                    debug!("Delivered confirmation {} on attempt {}", summary.booking_reference, attempt);
                    return attempt;
                }
                Err(e) if attempt % alert_after == 0 => {
                    error!(
                        "Confirmation {} still undelivered after {} attempts: {}",
                        summary.booking_reference, attempt, e
                    );
                }
                Err(e) => {
                    warn!(
                        "Confirmation {} delivery attempt {} failed: {}",
                        summary.booking_reference, attempt, e
                    );
                }
            }
            tokio::time::sleep(self.policy.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
        }
    }
}
