//! Error types.

use thiserror::Error;

use crate::core::types::{Address, Sequence};

/// Rejections raised by the seed generator.
///
/// Every failure is a synchronous rejection of the triggering call and leaves
/// stored seeds untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    /// Caller lacks the executor capability.
    #[error("executor forbidden: {0}")]
    ExecutorForbidden(Address),

    /// Caller is not the owner.
    #[error("owner forbidden: {0}")]
    OwnerForbidden(Address),

    /// State-changing call while paused.
    #[error("generator is paused")]
    Paused,

    /// Operation requires the paused state.
    #[error("generator is not paused")]
    NotPaused,

    /// Constructed with a zero depth.
    #[error("max depth must be positive")]
    InvalidMaxDepth,

    /// A randomness request is still outstanding.
    #[error("previous random value request has not been fulfilled")]
    RequestNotFulfilled,

    /// Too many generated seeds are waiting for a reveal.
    #[error("too many pending reveals ({pending} >= max depth {max_depth})")]
    TooManyPendingReveals {
        /// Generated but unrevealed sequences.
        pending: u64,
        /// Configured bound.
        max_depth: u64,
    },

    /// Callback id unknown, stale, or from the wrong oracle.
    #[error("invalid oracle request")]
    InvalidRequest,

    /// The target sequence has no input seed yet.
    #[error("no input seed for sequence {0}")]
    NoInputSeed(Sequence),

    /// Proof rejected.
    #[error("wrong proving key")]
    WrongProvingKey,

    /// Queried input seed does not exist yet.
    #[error("input seed not ready")]
    InputSeedNotReady,

    /// Queried secret seed does not exist yet.
    #[error("secret seed not ready")]
    SecretSeedNotReady,

    /// Null oracle handle supplied.
    #[error("oracle handle must not be null")]
    InvalidOracleHandle,

    /// Attempt to overwrite a write-once seed slot.
    #[error("seed already recorded for sequence {0}")]
    SeedAlreadyRecorded(Sequence),

    /// The oracle collaborator refused the request.
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),
}

/// Failures submitting a request to the oracle collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The oracle side of the channel is gone.
    #[error("oracle disconnected")]
    Disconnected,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        reason: String,
    },

    /// Config file unreadable.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file malformed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Semantically invalid configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result alias for generator operations.
pub type SeedResult<T> = Result<T, SeedError>;
