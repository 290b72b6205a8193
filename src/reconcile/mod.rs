//! Single-worker queue that serializes every structural change made against the replicated store.
mod queue;
mod shutdown;
mod task;
mod time;

pub(crate) use queue::create;
pub(crate) use queue::ReconcileQueueClient;
pub(crate) use shutdown::QueueShutdownHandle;
pub(crate) use task::ReconcileTask;
pub(crate) use task::TaskOutcome;
pub(crate) use time::Clock;
pub(crate) use time::RealClock;

#[cfg(test)]
pub(crate) use time::{mocked_clock, MockClockController};
