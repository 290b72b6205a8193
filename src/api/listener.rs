use crate::member::ReplicaSetMember;
use std::sync::Arc;

/// Subscription interface for the collaborators that observe the group: the membership tracker
/// reports composition changes, and every member broadcasts whether it believes it is primary.
///
/// Callbacks may arrive concurrently on arbitrary threads, and may be delivered more than once.
/// Implementations must not block.
pub trait MembershipListener: Send + Sync {
    fn on_member_added(&self, member: Arc<dyn ReplicaSetMember>);

    fn on_member_removed(&self, member: &dyn ReplicaSetMember);

    fn on_primary_signal(&self, member: &dyn ReplicaSetMember, is_primary: bool);
}
