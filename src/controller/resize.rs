use crate::api::{ScaleError, MAX_MEMBERS, MIN_MEMBERS};

// Arbiters are not supported, so every member votes. That rules out even sizes.
#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    #[error("Ignored request to resize replica set to even number of members ({desired}); only voting members are supported. Size stays {current_size}.")]
    EvenMemberCount { desired: usize, current_size: usize },

    #[error("Ignored request to resize replica set to {desired}, below the minimum of {min}. Size stays {current_size}.", min = MIN_MEMBERS)]
    BelowMinimum { desired: usize, current_size: usize },

    #[error("Ignored request to resize replica set to {desired}, above the maximum of {max}. Size stays {current_size}.", max = MAX_MEMBERS)]
    AboveMaximum { desired: usize, current_size: usize },

    #[error("Failed to resize replica set")]
    Scaler(#[from] ScaleError),
}

/// A size is acceptable if it tears the set down entirely, or is odd and within bounds.
pub(super) fn check_desired_size(desired: usize, current_size: usize) -> Result<(), ResizeError> {
    if desired == 0 || (desired >= MIN_MEMBERS && desired <= MAX_MEMBERS && desired % 2 == 1) {
        return Ok(());
    }

    if desired % 2 == 0 {
        return Err(ResizeError::EvenMemberCount { desired, current_size });
    }
    if desired < MIN_MEMBERS {
        return Err(ResizeError::BelowMinimum { desired, current_size });
    }

    Err(ResizeError::AboveMaximum { desired, current_size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_odd_sizes_in_bounds() {
        for desired in &[0, 3, 5, 7] {
            assert!(check_desired_size(*desired, 3).is_ok(), "{} should be accepted", desired);
        }
    }

    #[test]
    fn rejects_even_sizes() {
        for desired in &[2, 4, 6, 8] {
            assert!(matches!(
                check_desired_size(*desired, 5),
                Err(ResizeError::EvenMemberCount { current_size: 5, .. })
            ));
        }
    }

    #[test]
    fn rejects_out_of_bounds_odd_sizes() {
        assert!(matches!(
            check_desired_size(1, 3),
            Err(ResizeError::BelowMinimum { desired: 1, current_size: 3 })
        ));
        assert!(matches!(
            check_desired_size(9, 3),
            Err(ResizeError::AboveMaximum { desired: 9, current_size: 3 })
        ));
    }
}
