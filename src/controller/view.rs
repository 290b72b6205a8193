use crate::member::{Member, MemberId, ReplicaSetMember};
use std::sync::Arc;

pub(super) enum Admission {
    /// First member ever seen. It must bootstrap the set.
    Bootstrap(Member),
    Join(Member),
    Duplicate,
}

pub(super) struct Eviction {
    pub(super) member: Member,
    pub(super) was_primary: bool,
}

#[derive(Debug, Eq, PartialEq)]
pub(super) enum PrimaryUpdate {
    Changed,
    Unchanged,
    UnknownMember,
}

/// The controller's belief about the replica set. Only ever accessed under the controller's
/// lock, and never held across an await.
///
/// Invariant: `primary`, if set, is the key of an entry in `members`.
pub(super) struct ReplicaSetView {
    members: Vec<Member>,
    primary: Option<String>,
    // One-shot. Flips on the first admission, whether or not the bootstrap call later succeeds.
    initialized: bool,
    next_id: u32,
    closed: bool,
}

impl ReplicaSetView {
    pub(super) fn new() -> Self {
        ReplicaSetView {
            members: vec![],
            primary: None,
            initialized: false,
            next_id: 0,
            closed: false,
        }
    }

    /// Tracks a newly reported member and allocates its ID. The ID stays with the member for
    /// every retry of its join; it is never handed out again.
    pub(super) fn admit(&mut self, handle: Arc<dyn ReplicaSetMember>) -> Admission {
        if self.contains(handle.key()) {
            return Admission::Duplicate;
        }

        let member = Member::new(self.allocate_id(), handle);
        self.members.push(member.clone());

        if self.try_begin_bootstrap() {
            Admission::Bootstrap(member)
        } else {
            Admission::Join(member)
        }
    }

    /// Stops tracking a member. Clears the primary reference if it pointed at this member, so no
    /// task addresses a removed primary.
    pub(super) fn evict(&mut self, key: &str) -> Option<Eviction> {
        let position = self.members.iter().position(|member| member.key() == key)?;
        let member = self.members.remove(position);

        let was_primary = self.primary.as_deref() == Some(key);
        if was_primary {
            self.primary = None;
        }

        Some(Eviction { member, was_primary })
    }

    /// Last write wins. There is no term or fencing check on primary signals.
    pub(super) fn set_primary(&mut self, key: &str) -> PrimaryUpdate {
        if !self.contains(key) {
            return PrimaryUpdate::UnknownMember;
        }
        if self.primary.as_deref() == Some(key) {
            return PrimaryUpdate::Unchanged;
        }

        self.primary = Some(key.to_string());
        PrimaryUpdate::Changed
    }

    pub(super) fn primary(&self) -> Option<Member> {
        let primary_key = self.primary.as_deref()?;
        self.members.iter().find(|member| member.key() == primary_key).cloned()
    }

    /// ID of the member currently tracked under `key`. A key that was removed and reported again
    /// maps to the ID of its latest admission.
    pub(super) fn admitted_id(&self, key: &str) -> Option<MemberId> {
        self.members.iter().find(|member| member.key() == key).map(Member::id)
    }

    /// True iff `member` is the admission the view currently tracks, not an earlier one under
    /// the same key.
    pub(super) fn is_current(&self, member: &Member) -> bool {
        self.admitted_id(member.key()) == Some(member.id())
    }

    /// Once closed, the view stops tracking membership changes.
    pub(super) fn close(&mut self) {
        self.closed = true;
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(super) fn contains(&self, key: &str) -> bool {
        self.members.iter().any(|member| member.key() == key)
    }

    pub(super) fn members(&self) -> &[Member] {
        &self.members
    }

    fn allocate_id(&mut self) -> MemberId {
        let id = MemberId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn try_begin_bootstrap(&mut self) -> bool {
        if self.initialized {
            return false;
        }

        self.initialized = true;
        true
    }
}
