//! Error types for configuration and session persistence.
//!
//! The simulation itself never fails: invalid input is ignored and invariant
//! violations are clamped. Errors only surface at the edges where data comes
//! in from outside (tuning files, saved sessions).

/// Errors raised while validating or loading a `GameConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config document was not valid JSON for `GameConfig`.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A numeric field was zero, negative, or non-finite where that is not allowed.
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A range field had its lower bound above its upper bound.
    #[error("inverted range for `{field}`: {lo} > {hi}")]
    InvertedRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },

    /// A list that needs at least one entry was empty.
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
}

/// Errors raised while saving or restoring a session.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Encoding or decoding the JSON envelope failed.
    #[error("session JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope was written by an incompatible format version.
    #[error("unsupported save version {found} (expected {expected})")]
    Version {
        /// Version found in the envelope.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// The envelope's game id does not match the session it carries.
    #[error("save is for `{envelope}` but session is `{session}`")]
    GameMismatch {
        /// Game id stored on the envelope.
        envelope: String,
        /// Game id derived from the session.
        session: String,
    },

    /// The restored session violates a state invariant.
    #[error("restored session is invalid: {0}")]
    InvalidState(String),

    /// The restored session carries a config that fails validation.
    #[error("restored config is invalid: {0}")]
    Config(#[from] ConfigError),
}
