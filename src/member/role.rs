use crate::member::member::{MemberRole, ReplicaSetMember};

/// True iff the member last reported itself as primary.
pub fn is_primary(member: &dyn ReplicaSetMember) -> bool {
    member.role() == MemberRole::Primary
}

/// True iff the member last reported itself as secondary.
pub fn is_secondary(member: &dyn ReplicaSetMember) -> bool {
    member.role() == MemberRole::Secondary
}
