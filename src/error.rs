//! Error types for the replay crate.

use thiserror::Error;

/// Errors that can occur while loading, replaying, or reporting a gesture.
///
/// Every variant is terminal for a single trial attempt: the control loop
/// surfaces the error to the operator display and waits for the next
/// command. There is no retry policy.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Motion file missing, unreadable, or containing a malformed field.
    #[error("motion file at '{path}' could not be loaded: {reason}")]
    MotionLoad {
        /// The resolved path (after extension normalization).
        path: String,
        /// Why the load failed.
        reason: String,
    },

    /// Metadata file missing, malformed JSON, or wrong shape.
    #[error("metadata file at '{path}' could not be parsed: {reason}")]
    MetadataParse {
        /// The resolved path (after extension normalization).
        path: String,
        /// Why the parse failed.
        reason: String,
    },

    /// Datagram send or receive failure.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Malformed inbound command payload.
    #[error("malformed command: {reason}")]
    Protocol {
        /// What was wrong with the payload.
        reason: String,
    },

    /// A motion table holds no playable frames; the replay never starts.
    #[error("motion data contains no playable frames")]
    EmptyMotion,

    /// A replay command arrived while a trial was already running.
    #[error("a trial is already in progress; wait for its result before issuing a new command")]
    TrialInProgress,
}

impl ReplayError {
    /// Creates a motion load error.
    pub fn motion_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MotionLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a metadata parse error.
    pub fn metadata_parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MetadataParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }
}
