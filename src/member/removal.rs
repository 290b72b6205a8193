use crate::member::member::Member;
use crate::member::role::is_primary;

/// Picks the member to evict when scaling down. Any non-primary member is preferred, taking the
/// first one in iteration order. If every member claims to be primary, the first member is
/// returned.
///
/// Panics if `members` is empty. The replica set never shrinks below its minimum size through a
/// resize, so callers must not ask for a removal candidate from an empty set.
pub fn choose_removal(members: &[Member]) -> Member {
    assert!(
        !members.is_empty(),
        "Expected at least one member to choose a removal candidate from"
    );

    members
        .iter()
        .find(|member| !is_primary(member.handle().as_ref()))
        .unwrap_or(&members[0])
        .clone()
}
