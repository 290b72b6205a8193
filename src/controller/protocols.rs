//! The three structural protocols. Each one runs on the reconciliation queue, so none of them
//! ever overlaps with another structural change.
use crate::api::ReplicaSetState;
use crate::controller::context::SetContext;
use crate::controller::view::PrimaryUpdate;
use crate::member::Member;
use crate::reconcile::{ReconcileTask, TaskOutcome};
use std::sync::Arc;

fn member_logger(context: &SetContext, member: &Member) -> slog::Logger {
    context
        .logger
        .new(slog::o!("Member" => member.key().to_string(), "MemberId" => member.id().as_u32()))
}

/// Creates the replica set from its first member. Runs exactly once and is never retried: a
/// failure here is a configuration problem, not a transient one.
pub(super) struct BootstrapTask {
    logger: slog::Logger,
    context: Arc<SetContext>,
    member: Member,
}

impl BootstrapTask {
    pub(super) fn new(context: Arc<SetContext>, member: Member) -> Self {
        BootstrapTask {
            logger: member_logger(&context, &member),
            context,
            member,
        }
    }
}

#[async_trait::async_trait]
impl ReconcileTask for BootstrapTask {
    async fn run(&mut self) -> TaskOutcome {
        let client = self.member.handle().client();
        let result = client.initialize_set(&self.context.name, self.member.id()).await;

        match result {
            Ok(()) => {
                let update = self.context.view().set_primary(self.member.key());
                if update == PrimaryUpdate::UnknownMember {
                    slog::warn!(
                        self.logger,
                        "Initialized replica set {}, but the member was removed in the meantime.",
                        self.context.name,
                    );
                } else {
                    slog::info!(self.logger, "Initialized replica set {}", self.context.name);
                }
                self.context.status.notify(ReplicaSetState::Stable, true);
            }
            Err(e) => {
                slog::error!(
                    self.logger,
                    "Failed to initialize replica set {}: {}. Not retrying.",
                    self.context.name,
                    e,
                );
                self.context.status.notify(ReplicaSetState::Degraded, false);
            }
        }

        TaskOutcome::Done
    }

    fn describe(&self) -> String {
        format!("bootstrap of {} from {:?}", self.context.name, self.member)
    }
}

/// Adds a member through the current primary, once the member is available and a primary is
/// known. The member's ID was allocated when the task was created and is reused on every retry.
pub(super) struct JoinTask {
    logger: slog::Logger,
    context: Arc<SetContext>,
    candidate: Member,
}

impl JoinTask {
    pub(super) fn new(context: Arc<SetContext>, candidate: Member) -> Self {
        JoinTask {
            logger: member_logger(&context, &candidate),
            context,
            candidate,
        }
    }
}

#[async_trait::async_trait]
impl ReconcileTask for JoinTask {
    async fn run(&mut self) -> TaskOutcome {
        let (current, primary) = {
            let view = self.context.view();
            (view.is_current(&self.candidate), view.primary())
        };

        // A member that left, even one reported again since, is joined by the task of its
        // latest admission. This one is stale.
        if !current {
            slog::info!(
                self.logger,
                "Member left before it joined replica set {}. Dropping addition.",
                self.context.name,
            );
            return TaskOutcome::Done;
        }

        let available = self.candidate.handle().is_available();
        let primary = match primary {
            Some(primary) if available => primary,
            unusable => {
                slog::trace!(
                    self.logger,
                    "Rescheduling addition of member to replica set {}: available={}, primary={:?}",
                    self.context.name,
                    available,
                    unusable,
                );
                return TaskOutcome::Retry;
            }
        };

        let client = primary.handle().client();
        match client
            .add_member(self.candidate.handle().as_ref(), self.candidate.id())
            .await
        {
            Ok(()) => {
                slog::info!(self.logger, "Added to replica set {}", self.context.name);
                TaskOutcome::Done
            }
            Err(e) => {
                slog::warn!(
                    self.logger,
                    "Primary {:?} failed to add member to replica set {}: {}. Will retry.",
                    primary,
                    self.context.name,
                    e,
                );
                TaskOutcome::Retry
            }
        }
    }

    fn describe(&self) -> String {
        format!("addition of {:?} to {}", self.candidate, self.context.name)
    }

    fn on_retries_exhausted(&mut self) {
        slog::error!(
            self.logger,
            "Member was never added to replica set {}. It stays tracked but is not part of the set's configuration.",
            self.context.name,
        );
    }
}

/// Removes a departed member through the current primary. The store wants the member's process
/// stopped first, so this waits until the member reports itself unavailable.
pub(super) struct LeaveTask {
    logger: slog::Logger,
    context: Arc<SetContext>,
    departed: Member,
}

impl LeaveTask {
    pub(super) fn new(context: Arc<SetContext>, departed: Member) -> Self {
        LeaveTask {
            logger: member_logger(&context, &departed),
            context,
            departed,
        }
    }
}

#[async_trait::async_trait]
impl ReconcileTask for LeaveTask {
    async fn run(&mut self) -> TaskOutcome {
        let (readmitted_as, primary) = {
            let view = self.context.view();
            (view.admitted_id(self.departed.key()), view.primary())
        };

        if let Some(id) = readmitted_as {
            slog::info!(
                self.logger,
                "Member rejoined replica set {} as {} before it was removed. Dropping removal.",
                self.context.name,
                id,
            );
            return TaskOutcome::Done;
        }

        let available = self.departed.handle().is_available();
        // After a primary leaves, wait for the set to elect a new one.

        let primary = match primary {
            Some(primary) if !available => primary,
            unusable => {
                slog::trace!(
                    self.logger,
                    "Rescheduling removal of member from replica set {}: available={}, primary={:?}",
                    self.context.name,
                    available,
                    unusable,
                );
                return TaskOutcome::Retry;
            }
        };

        let client = primary.handle().client();
        match client.remove_member(self.departed.handle().as_ref()).await {
            Ok(()) => {
                slog::info!(self.logger, "Removed from replica set {}", self.context.name);
                TaskOutcome::Done
            }
            Err(e) => {
                slog::warn!(
                    self.logger,
                    "Primary {:?} failed to remove member from replica set {}: {}. Will retry.",
                    primary,
                    self.context.name,
                    e,
                );
                TaskOutcome::Retry
            }
        }
    }

    fn describe(&self) -> String {
        format!("removal of {:?} from {}", self.departed, self.context.name)
    }

    fn on_retries_exhausted(&mut self) {
        slog::error!(
            self.logger,
            "Member was never removed from replica set {}. The set's configuration still lists it.",
            self.context.name,
        );
    }
}
