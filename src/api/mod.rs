//! This mod holds the library's client-facing API: configuration, the collaborator traits the
//! controller consumes, and the status stream it exposes.
mod listener;
mod options;
mod scaler;
mod status;
mod wiring;

pub use listener::MembershipListener;
pub use options::ReplicaSetOptions;
pub use options::MAX_MEMBERS;
pub use options::MIN_MEMBERS;
pub use scaler::GroupScaler;
pub use scaler::ScaleError;
pub use status::ReplicaSetState;
pub use status::ReplicaSetStatus;
pub use status::ReplicaSetStatusListener;
pub use wiring::try_create_replica_set;
pub use wiring::ReplicaSetConfig;
pub use wiring::ReplicaSetCreationError;

pub(crate) use options::ReplicaSetOptionsValidated;
pub(crate) use status::StatusNotifier;

#[cfg(test)]
pub(crate) use wiring::try_create_replica_set_with_clock;

pub(crate) fn status_channel(initial_state: ReplicaSetState) -> (StatusNotifier, ReplicaSetStatusListener) {
    status::new(initial_state)
}
