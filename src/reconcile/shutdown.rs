use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) fn shutdown_signal() -> (QueueShutdownHandle, QueueShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (QueueShutdownHandle { tx }, QueueShutdownSignal { rx })
}

/// Why the queue worker stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ShutdownCause {
    Requested,
    /// The owner went away without asking. The worker stops all the same.
    HandleDropped,
}

pub(crate) struct QueueShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl QueueShutdownHandle {
    pub(crate) fn shutdown(self) {
        // Err means the worker already exited.
        let _ = self.tx.send(());
    }
}

pub(crate) struct QueueShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for QueueShutdownSignal {
    type Output = ShutdownCause;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(()) => ShutdownCause::Requested,
            Err(_) => ShutdownCause::HandleDropped,
        })
    }
}
