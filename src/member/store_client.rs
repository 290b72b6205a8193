use crate::member::member::{MemberId, ReplicaSetMember};

/// Reconfiguration calls against the replicated store, addressed through one member. The wire
/// protocol behind these calls belongs to the store vendor.
///
/// The store only tolerates one structural change at a time, so callers must serialize these
/// calls. Within this crate, only the reconciliation queue worker issues them.
#[async_trait::async_trait]
pub trait ReplicatedStoreClient: Send + Sync {
    /// Create a brand new replica set with the addressed member as its only member.
    async fn initialize_set(&self, set_name: &str, self_id: MemberId) -> Result<(), StoreError>;

    /// Add `member` to the set. Must be addressed to the primary.
    async fn add_member(&self, member: &dyn ReplicaSetMember, new_id: MemberId) -> Result<(), StoreError>;

    /// Remove `member` from the set. Must be addressed to the primary.
    async fn remove_member(&self, member: &dyn ReplicaSetMember) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Timed out waiting for the store to respond")]
    Timeout,

    #[error("Connection to {0} refused")]
    ConnectionRefused(String),

    #[error("Store rejected reconfiguration: {0}")]
    Rejected(String),
}
