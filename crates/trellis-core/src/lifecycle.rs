//! Plugin instance lifecycle state machine.
//!
//! ```text
//! Constructed --init--> Configured --activate--> Active --start_processing--> Processing
//!                          |            ^   |      ^                              |
//!                          |            |   |      +-------stop_processing--------+
//!                          |  activate  |   |deactivate
//!                          |            |   v
//!                          |          Inactive
//!                          |              |
//!                          +---destroy----+----> Destroyed
//! ```
//!
//! A failed `init` moves the instance to [`LifecycleState::Failed`], from
//! which only `destroy` is accepted.

use crate::error::{PluginError, PluginResult};

/// Lifecycle state of a plugin instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created by the factory, not yet configured.
    Constructed,
    /// Parameters registered and validated.
    Configured,
    /// Deactivated after having been active.
    Inactive,
    /// Activated with a sample rate and block size range.
    Active,
    /// Inside a `start_processing`/`stop_processing` bracket.
    Processing,
    /// Released; the instance is unusable.
    Destroyed,
    /// Initialization failed; only `destroy` is accepted.
    Failed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Constructed => "constructed",
            Self::Configured => "configured",
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Processing => "processing",
            Self::Destroyed => "destroyed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Lifecycle calls the host can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Init,
    Activate,
    StartProcessing,
    StopProcessing,
    Deactivate,
    Reset,
    Destroy,
}

impl Transition {
    /// Name used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Activate => "activate",
            Self::StartProcessing => "start processing",
            Self::StopProcessing => "stop processing",
            Self::Deactivate => "deactivate",
            Self::Reset => "reset",
            Self::Destroy => "destroy",
        }
    }
}

impl LifecycleState {
    /// State reached by applying `transition`, or an error if the call is not
    /// allowed from this state.
    pub fn apply(self, transition: Transition) -> PluginResult<LifecycleState> {
        use LifecycleState::*;
        let next = match (self, transition) {
            (Constructed, Transition::Init) => Configured,
            (Configured | Inactive, Transition::Activate) => Active,
            (Active, Transition::StartProcessing) => Processing,
            (Processing, Transition::StopProcessing) => Active,
            (Active, Transition::Deactivate) => Inactive,
            (Active, Transition::Reset) => Active,
            (Constructed | Configured | Inactive | Failed, Transition::Destroy) => Destroyed,
            (from, transition) => {
                return Err(PluginError::InvalidTransition {
                    from,
                    action: transition.name(),
                })
            }
        };
        Ok(next)
    }

    /// Whether the processor has sample-rate-dependent resources allocated.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active | Self::Processing)
    }

    /// Whether `init` completed successfully and `destroy` has not run.
    pub fn is_initialized(&self) -> bool {
        matches!(
            self,
            Self::Configured | Self::Inactive | Self::Active | Self::Processing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lifecycle() {
        let mut state = LifecycleState::Constructed;
        for (transition, expected) in [
            (Transition::Init, LifecycleState::Configured),
            (Transition::Activate, LifecycleState::Active),
            (Transition::StartProcessing, LifecycleState::Processing),
            (Transition::StopProcessing, LifecycleState::Active),
            (Transition::Reset, LifecycleState::Active),
            (Transition::Deactivate, LifecycleState::Inactive),
            (Transition::Activate, LifecycleState::Active),
            (Transition::Deactivate, LifecycleState::Inactive),
            (Transition::Destroy, LifecycleState::Destroyed),
        ] {
            state = state.apply(transition).unwrap();
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(LifecycleState::Processing.apply(Transition::Deactivate).is_err());
        assert!(LifecycleState::Processing.apply(Transition::Reset).is_err());
        assert!(LifecycleState::Active.apply(Transition::Destroy).is_err());
        assert!(LifecycleState::Constructed.apply(Transition::Activate).is_err());
        assert!(LifecycleState::Destroyed.apply(Transition::Destroy).is_err());
        assert!(LifecycleState::Failed.apply(Transition::Activate).is_err());
        assert_eq!(
            LifecycleState::Failed.apply(Transition::Destroy).unwrap(),
            LifecycleState::Destroyed
        );
    }

    #[test]
    fn test_error_names_state_and_call() {
        let err = LifecycleState::Configured
            .apply(Transition::StartProcessing)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot start processing while configured");
    }
}
