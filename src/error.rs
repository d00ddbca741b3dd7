//! Error types for simulation and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Collisions are not errors; they are reported through
/// [`StepOutcome`](crate::sim::StepOutcome).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A parameter was rejected at construction time.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParams {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The derivative or the integrated state became non-finite.
    #[error("numerical divergence at t = {t}")]
    NumericalDivergence {
        /// Integration time at which the non-finite value appeared.
        t: f64,
    },

    /// A single advance needed more internal substeps than allowed.
    #[error("substep limit of {limit} exceeded at t = {t}")]
    SubstepLimit {
        /// Configured maximum number of substep attempts.
        limit: u32,
        /// Integration time reached when the limit was hit.
        t: f64,
    },

    /// The step-size controller fell below the floating resolution of `t`.
    #[error("step size {h:e} too small at t = {t}")]
    StepSizeUnderflow {
        /// Integration time.
        t: f64,
        /// Rejected step size.
        h: f64,
    },
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParams {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading or validating [`Settings`](crate::Settings).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings document is not valid JSON for [`Settings`](crate::Settings).
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// The settings parsed but describe an invalid simulation.
    #[error(transparent)]
    Invalid(#[from] SimError),
}
