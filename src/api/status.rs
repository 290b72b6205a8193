use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Lifecycle of the replica set, from the controller's point of view.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReplicaSetState {
    /// No member has been added yet.
    Empty,
    /// The first member was added and its bootstrap call has not finished.
    Bootstrapping,
    /// Bootstrap succeeded. Later joins and leaves happen in the background.
    Stable,
    /// Bootstrap failed. This is not retried and needs an operator.
    Degraded,
    /// The controller was shut down.
    Stopped,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicaSetStatus {
    pub state: ReplicaSetState,
    pub service_up: bool,
    pub changed_at: DateTime<Utc>,
}

pub(crate) fn new(initial_state: ReplicaSetState) -> (StatusNotifier, ReplicaSetStatusListener) {
    let (snd, rcv) = watch::channel(ReplicaSetStatus {
        state: initial_state,
        service_up: false,
        changed_at: Utc::now(),
    });

    (
        StatusNotifier {
            snd,
            current: rcv.clone(),
        },
        ReplicaSetStatusListener { rcv },
    )
}

pub(crate) struct StatusNotifier {
    snd: watch::Sender<ReplicaSetStatus>,
    // Keeps the channel open even when nobody listens, and lets us read back the latest value.
    current: watch::Receiver<ReplicaSetStatus>,
}

impl StatusNotifier {
    pub(crate) fn notify(&self, state: ReplicaSetState, service_up: bool) {
        let _ = self.snd.send(ReplicaSetStatus {
            state,
            service_up,
            changed_at: Utc::now(),
        });
    }

    pub(crate) fn current(&self) -> ReplicaSetStatus {
        self.current.borrow().clone()
    }
}

/// Subscription to replica set lifecycle changes. Like any watch, it does not queue intermediate
/// values: if several changes happen between two calls to `next()`, only the latest is seen.
#[derive(Clone)]
pub struct ReplicaSetStatusListener {
    rcv: watch::Receiver<ReplicaSetStatus>,
}

impl ReplicaSetStatusListener {
    /// Waits for the next status change. Returns `None` once the controller is gone.
    pub async fn next(&mut self) -> Option<ReplicaSetStatus> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }

    pub fn current(&self) -> ReplicaSetStatus {
        self.rcv.borrow().clone()
    }
}
