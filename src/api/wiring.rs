use crate::api::options::ReplicaSetOptionsValidated;
use crate::api::{GroupScaler, ReplicaSetOptions};
use crate::controller::ReplicaSetController;
use crate::reconcile::{Clock, RealClock};
use std::convert::TryFrom;
use std::sync::Arc;

pub struct ReplicaSetConfig {
    /// Name of the replica set, passed to the store on bootstrap.
    pub name: String,
    pub info_logger: slog::Logger,
    pub scaler: Arc<dyn GroupScaler>,
    pub options: ReplicaSetOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicaSetCreationError {
    #[error("Replica set name must not be blank")]
    BlankName,
    #[error("Illegal options for configuring replica set: {0}")]
    IllegalOptions(String),
}

/// Creates a controller and spawns its reconciliation worker. Must be called from within a tokio
/// runtime.
///
/// Wire the returned controller up as the `MembershipListener` of your membership tracker and
/// primary signals.
pub fn try_create_replica_set(config: ReplicaSetConfig) -> Result<ReplicaSetController, ReplicaSetCreationError> {
    try_create_replica_set_with_clock(config, RealClock)
}

pub(crate) fn try_create_replica_set_with_clock<C>(
    config: ReplicaSetConfig,
    clock: C,
) -> Result<ReplicaSetController, ReplicaSetCreationError>
where
    C: Clock + Send + Sync + 'static,
{
    if config.name.trim().is_empty() {
        return Err(ReplicaSetCreationError::BlankName);
    }

    let options = ReplicaSetOptionsValidated::try_from(config.options)
        .map_err(|e| ReplicaSetCreationError::IllegalOptions(e.to_string()))?;

    Ok(ReplicaSetController::spawn(
        config.info_logger,
        config.name,
        config.scaler,
        options,
        clock,
    ))
}
