#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TaskOutcome {
    Done,
    /// Preconditions were not met, or the store call failed. Run the same task again after the
    /// queue's retry delay.
    Retry,
}

/// A unit of work executed by the reconciliation queue. Tasks never run concurrently with each
/// other, so a task may issue a structural change against the store without further locking.
///
/// A task must not block waiting for its preconditions. It should check them and return
/// `TaskOutcome::Retry` so the worker can move on to other tasks.
#[async_trait::async_trait]
pub(crate) trait ReconcileTask: Send {
    async fn run(&mut self) -> TaskOutcome;

    /// Short human readable description for logs.
    fn describe(&self) -> String;

    /// Called when the queue gives up on this task after its retry budget is spent.
    fn on_retries_exhausted(&mut self) {}
}
