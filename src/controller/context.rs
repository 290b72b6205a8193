use crate::api::StatusNotifier;
use crate::controller::view::ReplicaSetView;
use std::sync::{Mutex, MutexGuard};

/// State shared between the controller's event handlers and the protocol tasks running on the
/// reconciliation queue.
pub(super) struct SetContext {
    pub(super) logger: slog::Logger,
    pub(super) name: String,
    pub(super) status: StatusNotifier,
    view: Mutex<ReplicaSetView>,
}

impl SetContext {
    pub(super) fn new(logger: slog::Logger, name: String, status: StatusNotifier) -> Self {
        SetContext {
            logger,
            name,
            status,
            view: Mutex::new(ReplicaSetView::new()),
        }
    }

    pub(super) fn view(&self) -> MutexGuard<'_, ReplicaSetView> {
        self.view.lock().expect("Replica set view mutex guard poison")
    }
}
