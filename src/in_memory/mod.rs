mod store;

pub use store::InMemoryMember;
pub use store::InMemoryReplicatedStore;
