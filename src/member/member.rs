use crate::member::store_client::ReplicatedStoreClient;
use std::fmt;
use std::sync::Arc;

/// Last-known replica role of a member, as reported by the replicated store.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemberRole {
    Unknown,
    Primary,
    Secondary,
}

/// ID of a member within the replica set configuration. IDs are handed out by the controller,
/// starting from 0, and are never reused.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemberId(u32);

impl MemberId {
    pub fn new(id: u32) -> Self {
        MemberId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ReplicaSetMember is the capability any node must expose to take part in a replica set. The
/// provisioning layer decides which implementation to hand us when it reports a new node; the
/// controller only ever talks to nodes through this trait.
pub trait ReplicaSetMember: Send + Sync {
    /// Stable identity of the node. Two handles with the same key are the same member.
    fn key(&self) -> &str;

    /// Last-known liveness signal from health monitoring.
    fn is_available(&self) -> bool;

    /// Last-known role signal from the replicated store.
    fn role(&self) -> MemberRole;

    /// Client for issuing reconfiguration calls through this member.
    fn client(&self) -> Arc<dyn ReplicatedStoreClient>;

    /// Address other members and clients use to reach this node.
    fn endpoint(&self) -> Option<String> {
        None
    }

    /// The primary's endpoint, as currently seen by this node.
    fn reported_primary_endpoint(&self) -> Option<String> {
        None
    }
}

/// A member as tracked by the controller: the node handle plus the ID it was admitted with.
#[derive(Clone)]
pub struct Member {
    id: MemberId,
    handle: Arc<dyn ReplicaSetMember>,
}

impl Member {
    pub(crate) fn new(id: MemberId, handle: Arc<dyn ReplicaSetMember>) -> Self {
        Member { id, handle }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn key(&self) -> &str {
        self.handle.key()
    }

    pub fn handle(&self) -> &Arc<dyn ReplicaSetMember> {
        &self.handle
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("key", &self.key())
            .field("id", &self.id)
            .finish()
    }
}
