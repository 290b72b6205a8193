mod member;
mod removal;
mod role;
mod store_client;

pub use member::Member;
pub use member::MemberId;
pub use member::MemberRole;
pub use member::ReplicaSetMember;
pub use removal::choose_removal;
pub use role::is_primary;
pub use role::is_secondary;
pub use store_client::ReplicatedStoreClient;
pub use store_client::StoreError;
