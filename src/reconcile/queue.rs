use crate::reconcile::shutdown::{self, QueueShutdownHandle, QueueShutdownSignal, ShutdownCause};
use crate::reconcile::task::{ReconcileTask, TaskOutcome};
use crate::reconcile::time::Clock;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{Duration, Instant};

pub(crate) fn create<C: Clock>(
    logger: slog::Logger,
    retry_delay: Duration,
    max_task_attempts: Option<u32>,
    clock: C,
) -> (ReconcileQueueClient, QueueShutdownHandle, ReconcileWorker<C>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_handle, shutdown_signal) = shutdown::shutdown_signal();

    let client = ReconcileQueueClient { sender: tx };
    let worker = ReconcileWorker {
        logger,
        receiver: rx,
        shutdown: shutdown_signal,
        clock,
        retry_delay,
        max_task_attempts,
        ready: VecDeque::new(),
        delayed: BinaryHeap::new(),
        next_seq: 0,
        submissions_closed: false,
    };

    (client, shutdown_handle, worker)
}

#[derive(Debug, thiserror::Error)]
#[error("Reconciliation queue has shut down")]
pub(crate) struct QueueClosed;

#[derive(Clone)]
pub(crate) struct ReconcileQueueClient {
    sender: mpsc::UnboundedSender<Box<dyn ReconcileTask>>,
}

impl ReconcileQueueClient {
    /// Non-blocking, so it is safe to call while holding a std lock.
    pub(crate) fn submit(&self, task: Box<dyn ReconcileTask>) -> Result<(), QueueClosed> {
        self.sender.send(task).map_err(|_| QueueClosed)
    }
}

struct Scheduled {
    task: Box<dyn ReconcileTask>,
    attempts: u32,
}

struct Delayed {
    wake_at: Instant,
    // Tie-breaker so tasks due at the same instant keep the order in which they were delayed.
    seq: u64,
    scheduled: Scheduled,
}

// BinaryHeap is a max-heap; order reversed so the earliest deadline is on top.
impl Ord for Delayed {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .wake_at
            .cmp(&self.wake_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Delayed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Delayed {
    fn eq(&self, other: &Self) -> bool {
        self.wake_at == other.wake_at && self.seq == other.seq
    }
}

impl Eq for Delayed {}

enum Wakeup {
    Shutdown(ShutdownCause),
    Submitted(Option<Box<dyn ReconcileTask>>),
    RetryDue,
}

/// ReconcileWorker is the single consumer of the queue. It runs one task at a time, in the order
/// tasks became ready: either submitted, or their retry delay elapsed.
pub(crate) struct ReconcileWorker<C: Clock> {
    logger: slog::Logger,
    receiver: mpsc::UnboundedReceiver<Box<dyn ReconcileTask>>,
    shutdown: QueueShutdownSignal,
    clock: C,
    retry_delay: Duration,
    max_task_attempts: Option<u32>,
    ready: VecDeque<Scheduled>,
    delayed: BinaryHeap<Delayed>,
    next_seq: u64,
    submissions_closed: bool,
}

impl<C: Clock + Send + Sync + 'static> ReconcileWorker<C> {
    pub(crate) async fn run(mut self) {
        loop {
            self.promote_due_tasks();

            if let Some(mut scheduled) = self.ready.pop_front() {
                // Shutdown is immediate: a task that is mid-flight is dropped, not awaited.
                let outcome = tokio::select! {
                    biased;
                    cause = &mut self.shutdown => Err(cause),
                    outcome = scheduled.task.run() => Ok(outcome),
                };

                match outcome {
                    Ok(outcome) => self.handle_outcome(scheduled, outcome),
                    Err(cause) => {
                        slog::debug!(
                            self.logger,
                            "Reconciliation queue shut down ({:?}). Abandoning {} and {} other task(s).",
                            cause,
                            scheduled.task.describe(),
                            self.pending_count(),
                        );
                        return;
                    }
                }

                self.drain_submissions();
                continue;
            }

            if self.submissions_closed && self.delayed.is_empty() {
                slog::debug!(self.logger, "All queue clients dropped and no tasks remain. Exiting.");
                return;
            }

            let next_wake = self.delayed.peek().map(|delayed| delayed.wake_at);
            let wakeup = tokio::select! {
                biased;
                cause = &mut self.shutdown => Wakeup::Shutdown(cause),
                received = self.receiver.recv(), if !self.submissions_closed => Wakeup::Submitted(received),
                _ = sleep_until_next(&mut self.clock, next_wake) => Wakeup::RetryDue,
            };

            match wakeup {
                Wakeup::Shutdown(cause) => {
                    slog::debug!(
                        self.logger,
                        "Reconciliation queue shut down ({:?}). Abandoning {} task(s).",
                        cause,
                        self.pending_count(),
                    );
                    return;
                }
                Wakeup::Submitted(Some(task)) => self.ready.push_back(Scheduled { task, attempts: 0 }),
                Wakeup::Submitted(None) => self.submissions_closed = true,
                Wakeup::RetryDue => { /* promoted at top of loop */ }
            }
        }
    }

    fn handle_outcome(&mut self, mut scheduled: Scheduled, outcome: TaskOutcome) {
        scheduled.attempts += 1;

        match outcome {
            TaskOutcome::Done => {
                slog::trace!(
                    self.logger,
                    "Completed {} after {} attempt(s)",
                    scheduled.task.describe(),
                    scheduled.attempts,
                );
            }
            TaskOutcome::Retry => {
                if let Some(max_attempts) = self.max_task_attempts {
                    if scheduled.attempts >= max_attempts {
                        slog::warn!(
                            self.logger,
                            "Giving up on {} after {} attempt(s)",
                            scheduled.task.describe(),
                            scheduled.attempts,
                        );
                        scheduled.task.on_retries_exhausted();
                        return;
                    }
                }

                let wake_at = self.clock.now() + self.retry_delay;
                let seq = self.next_seq;
                self.next_seq += 1;
                self.delayed.push(Delayed {
                    wake_at,
                    seq,
                    scheduled,
                });
            }
        }
    }

    fn promote_due_tasks(&mut self) {
        let now = self.clock.now();
        while self.delayed.peek().map_or(false, |delayed| delayed.wake_at <= now) {
            if let Some(delayed) = self.delayed.pop() {
                self.ready.push_back(delayed.scheduled);
            }
        }
    }

    // Pull in whatever was submitted while a task was running, so new submissions queue up
    // behind retries that became due earlier, and not behind every future retry.
    fn drain_submissions(&mut self) {
        if self.submissions_closed {
            return;
        }

        loop {
            match self.receiver.try_recv() {
                Ok(task) => self.ready.push_back(Scheduled { task, attempts: 0 }),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.submissions_closed = true;
                    return;
                }
            }
        }
    }

    fn pending_count(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }
}

async fn sleep_until_next<C: Clock>(clock: &mut C, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => clock.sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
