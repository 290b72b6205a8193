use crate::api::{
    self, GroupScaler, MembershipListener, ReplicaSetOptionsValidated, ReplicaSetState, ReplicaSetStatus,
    ReplicaSetStatusListener,
};
use crate::controller::context::SetContext;
use crate::controller::endpoints;
use crate::controller::protocols::{BootstrapTask, JoinTask, LeaveTask};
use crate::controller::resize::{self, ResizeError};
use crate::controller::view::{Admission, PrimaryUpdate};
use crate::member::{choose_removal, is_secondary, Member, ReplicaSetMember};
use crate::reconcile::{self, Clock, QueueShutdownHandle, ReconcileQueueClient, ReconcileTask};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// ReplicaSetController keeps a replica set's configuration in line with the group of nodes
/// reported by the membership tracker. It bootstraps the set on the first member, then joins and
/// removes members one structural change at a time, and tracks which member is primary.
///
/// Cloning is cheap. All clones drive the same replica set.
#[derive(Clone)]
pub struct ReplicaSetController {
    shared: Arc<Shared>,
}

struct Shared {
    context: Arc<SetContext>,
    queue: ReconcileQueueClient,
    scaler: Arc<dyn GroupScaler>,
    status_listener: ReplicaSetStatusListener,
    queue_shutdown: Mutex<Option<QueueShutdownHandle>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ReplicaSetController {
    pub(crate) fn spawn<C>(
        logger: slog::Logger,
        name: String,
        scaler: Arc<dyn GroupScaler>,
        options: ReplicaSetOptionsValidated,
        clock: C,
    ) -> Self
    where
        C: Clock + Send + Sync + 'static,
    {
        let logger = logger.new(slog::o!("ReplicaSet" => name.clone()));

        let (queue, queue_shutdown, worker) =
            reconcile::create(logger.clone(), options.retry_delay, options.max_task_attempts, clock);
        let worker = tokio::spawn(worker.run());

        let (status, status_listener) = api::status_channel(ReplicaSetState::Empty);
        let context = Arc::new(SetContext::new(logger, name, status));

        ReplicaSetController {
            shared: Arc::new(Shared {
                context,
                queue,
                scaler,
                status_listener,
                queue_shutdown: Mutex::new(Some(queue_shutdown)),
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.context.name
    }

    /// The member currently believed to be primary: set by a successful bootstrap or by the
    /// latest primary signal, and cleared when that member is removed.
    pub fn primary(&self) -> Option<Member> {
        self.shared.context.view().primary()
    }

    /// Members whose last role report says secondary.
    pub fn secondaries(&self) -> Vec<Member> {
        self.members()
            .into_iter()
            .filter(|member| is_secondary(member.handle().as_ref()))
            .collect()
    }

    pub fn members(&self) -> Vec<Member> {
        self.shared.context.view().members().to_vec()
    }

    /// The member a scale-down should evict, or `None` if the set is empty.
    pub fn removal_candidate(&self) -> Option<Member> {
        let members = self.members();
        if members.is_empty() {
            return None;
        }

        Some(choose_removal(&members))
    }

    pub fn endpoints(&self) -> Vec<String> {
        endpoints::member_endpoints(&self.members())
    }

    pub fn primary_endpoint(&self) -> Option<String> {
        endpoints::primary_endpoint(&self.shared.context.logger, &self.members())
    }

    pub fn status(&self) -> ReplicaSetStatus {
        self.shared.status_listener.current()
    }

    pub fn status_listener(&self) -> ReplicaSetStatusListener {
        self.shared.status_listener.clone()
    }

    /// Asks the scaler to grow or shrink the group to `desired` members. Only 0, or an odd size
    /// between `MIN_MEMBERS` and `MAX_MEMBERS`, is accepted. Anything else is rejected before the
    /// scaler is touched, and the error carries the unchanged current size.
    pub async fn resize(&self, desired: usize) -> Result<usize, ResizeError> {
        let current_size = self.shared.scaler.current_size();
        if let Err(e) = resize::check_desired_size(desired, current_size) {
            slog::warn!(self.shared.context.logger, "{}", e);
            return Err(e);
        }

        slog::info!(
            self.shared.context.logger,
            "Resizing replica set {} from {} to {} member(s)",
            self.shared.context.name,
            current_size,
            desired,
        );
        Ok(self.shared.scaler.resize(desired).await?)
    }

    /// Stops the reconciliation queue immediately, abandoning queued and retrying tasks, and marks
    /// the service down. Members are left in the store's configuration so the set can be
    /// restarted later. From here on, membership callbacks are ignored and the view is frozen.
    pub async fn shutdown(&self) {
        self.shared.context.view().close();

        let queue_shutdown = self
            .shared
            .queue_shutdown
            .lock()
            .expect("Queue shutdown mutex guard poison")
            .take();
        if let Some(queue_shutdown) = queue_shutdown {
            queue_shutdown.shutdown();
        }

        let worker = self.shared.worker.lock().expect("Worker mutex guard poison").take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                slog::warn!(
                    self.shared.context.logger,
                    "Reconciliation worker exited abnormally: {}",
                    e
                );
            }
        }

        self.shared.context.status.notify(ReplicaSetState::Stopped, false);
        slog::info!(self.shared.context.logger, "Stopped replica set {}", self.shared.context.name);
    }

    fn submit(&self, task: Box<dyn ReconcileTask>) {
        let description = task.describe();
        if self.shared.queue.submit(task).is_err() {
            slog::warn!(
                self.shared.context.logger,
                "Replica set is shut down. Dropping {}.",
                description
            );
        }
    }
}

impl MembershipListener for ReplicaSetController {
    fn on_member_added(&self, handle: Arc<dyn ReplicaSetMember>) {
        let context = &self.shared.context;
        let key = handle.key().to_string();

        // Submit while still holding the view, so queue order matches ID order.
        let mut view = context.view();
        if view.is_closed() {
            slog::debug!(context.logger, "Replica set {} is stopped. Ignoring addition of {}", context.name, key);
            return;
        }

        match view.admit(handle) {
            Admission::Duplicate => {
                slog::debug!(context.logger, "Ignoring duplicate addition of {}", key);
            }
            Admission::Bootstrap(member) => {
                slog::info!(context.logger, "First member up in {} is {:?}", context.name, member);
                if context.status.current().state == ReplicaSetState::Empty {
                    context.status.notify(ReplicaSetState::Bootstrapping, false);
                }
                self.submit(Box::new(BootstrapTask::new(context.clone(), member)));
            }
            Admission::Join(member) => {
                slog::debug!(context.logger, "Scheduling addition of {:?} to {}", member, context.name);
                self.submit(Box::new(JoinTask::new(context.clone(), member)));
            }
        }
    }

    fn on_member_removed(&self, handle: &dyn ReplicaSetMember) {
        let context = &self.shared.context;

        let mut view = context.view();
        if view.is_closed() {
            slog::debug!(
                context.logger,
                "Replica set {} is stopped. Ignoring removal of {}",
                context.name,
                handle.key(),
            );
            return;
        }

        match view.evict(handle.key()) {
            None => {
                slog::debug!(
                    context.logger,
                    "Ignoring removal of {}, which is not a member of {}",
                    handle.key(),
                    context.name,
                );
            }
            Some(eviction) => {
                if eviction.was_primary {
                    slog::info!(
                        context.logger,
                        "Primary {:?} removed from {}. Waiting for a new primary.",
                        eviction.member,
                        context.name,
                    );
                }
                slog::debug!(
                    context.logger,
                    "Scheduling removal of {:?} from {}",
                    eviction.member,
                    context.name
                );
                self.submit(Box::new(LeaveTask::new(context.clone(), eviction.member)));
            }
        }
    }

    fn on_primary_signal(&self, handle: &dyn ReplicaSetMember, is_primary: bool) {
        if !is_primary {
            return;
        }

        let context = &self.shared.context;
        let update = {
            let mut view = context.view();
            if view.is_closed() {
                return;
            }
            view.set_primary(handle.key())
        };
        match update {
            PrimaryUpdate::Changed => {
                slog::info!(context.logger, "{} is now primary of {}", handle.key(), context.name);
            }
            PrimaryUpdate::Unchanged => {}
            PrimaryUpdate::UnknownMember => {
                slog::debug!(
                    context.logger,
                    "Ignoring primary signal from {}, which is not a member of {}",
                    handle.key(),
                    context.name,
                );
            }
        }
    }
}
