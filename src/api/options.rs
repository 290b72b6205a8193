use std::convert::TryFrom;
use tokio::time::Duration;

/// Smallest replica set that can still elect a primary after losing a member.
pub const MIN_MEMBERS: usize = 3;
/// Largest replica set in which every member votes.
pub const MAX_MEMBERS: usize = 7;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone, Default)]
pub struct ReplicaSetOptions {
    /// How long a join/leave task waits before re-checking its preconditions.
    pub retry_delay: Option<Duration>,
    /// Upper bound on how many times a join/leave task runs before it is abandoned. `None`
    /// keeps retrying until the preconditions hold or the replica set is shut down.
    pub max_task_attempts: Option<u32>,
}

pub(crate) struct ReplicaSetOptionsValidated {
    pub retry_delay: Duration,
    pub max_task_attempts: Option<u32>,
}

impl ReplicaSetOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.retry_delay == Duration::from_secs(0) {
            return Err("Retry delay must be greater than zero");
        }
        if self.max_task_attempts == Some(0) {
            return Err("Maximum task attempts must be greater than zero when set");
        }

        Ok(())
    }
}

impl TryFrom<ReplicaSetOptions> for ReplicaSetOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ReplicaSetOptions) -> Result<Self, Self::Error> {
        let values = ReplicaSetOptionsValidated {
            retry_delay: options.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            max_task_attempts: options.max_task_attempts,
        };

        values.validate()?;
        Ok(values)
    }
}
