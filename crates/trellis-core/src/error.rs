//! Error types for plugin lifecycle, configuration and persisted state.

use crate::lifecycle::LifecycleState;

/// Errors raised by the plugin instance and its collaborators.
#[derive(Debug)]
pub enum PluginError {
    /// The plugin's configuration is incomplete or invalid. Fatal for `init`.
    Configuration(String),
    /// A lifecycle call was made in a state that does not allow it.
    InvalidTransition {
        /// State the instance was in when the call arrived.
        from: LifecycleState,
        /// Name of the rejected call.
        action: &'static str,
    },
    /// The instance has not been initialized (or initialization failed).
    NotInitialized,
    /// An [`AudioInstance`](crate::AudioInstance) was handed back to an
    /// instance that did not create it.
    ForeignAudioInstance,
    /// Persisted state could not be saved or restored.
    State(StateError),
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidTransition { from, action } => {
                write!(f, "cannot {action} while {from}")
            }
            Self::NotInitialized => write!(f, "plugin is not initialized"),
            Self::ForeignAudioInstance => write!(f, "audio instance belongs to another plugin instance"),
            Self::State(err) => write!(f, "state error: {err}"),
        }
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::State(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StateError> for PluginError {
    fn from(err: StateError) -> Self {
        Self::State(err)
    }
}

/// Errors from saving or loading persisted parameter state.
#[derive(Debug)]
pub enum StateError {
    /// Fewer values were available than parameters declared.
    Truncated {
        /// Number of parameters declared.
        expected: usize,
        /// Number of complete values read.
        found: usize,
    },
    /// The underlying stream failed.
    Io(std::io::Error),
    /// The document could not be parsed or serialized.
    Parse(String),
    /// The document belongs to a different plugin.
    WrongPlugin {
        /// Id of this plugin.
        expected: String,
        /// Id stored in the document.
        found: String,
    },
    /// A required section is missing from the document.
    MissingSection(&'static str),
    /// The plugin refused to migrate an older document.
    Migration(String),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated { expected, found } => {
                write!(f, "state truncated: expected {expected} values, found {found}")
            }
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Parse(msg) => write!(f, "malformed state: {msg}"),
            Self::WrongPlugin { expected, found } => {
                write!(f, "state belongs to '{found}', expected '{expected}'")
            }
            Self::MissingSection(name) => write!(f, "missing [{name}] section"),
            Self::Migration(msg) => write!(f, "migration failed: {msg}"),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;
