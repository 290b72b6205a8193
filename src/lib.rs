mod api;
mod controller;
mod in_memory;
mod member;
mod reconcile;
#[cfg(test)]
mod test_utils;

pub use api::try_create_replica_set;
pub use api::GroupScaler;
pub use api::MembershipListener;
pub use api::ReplicaSetConfig;
pub use api::ReplicaSetCreationError;
pub use api::ReplicaSetOptions;
pub use api::ReplicaSetState;
pub use api::ReplicaSetStatus;
pub use api::ReplicaSetStatusListener;
pub use api::ScaleError;
pub use api::MAX_MEMBERS;
pub use api::MIN_MEMBERS;
pub use controller::ReplicaSetController;
pub use controller::ResizeError;
pub use in_memory::InMemoryMember;
pub use in_memory::InMemoryReplicatedStore;
pub use member::choose_removal;
pub use member::is_primary;
pub use member::is_secondary;
pub use member::Member;
pub use member::MemberId;
pub use member::MemberRole;
pub use member::ReplicaSetMember;
pub use member::ReplicatedStoreClient;
pub use member::StoreError;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`
// anywhere; types are exported through individual use statements.
