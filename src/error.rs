//! Error types for the siting pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SiteError>;

/// Fatal failures of a pipeline run.
///
/// Outcomes that are legitimate but empty, such as every candidate being
/// excluded by the proximity filter, are reported as
/// [`Diagnostic`](crate::pipeline::Diagnostic)s instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SiteError {
    /// The tessellation cannot be built with the requested cell size.
    #[error("invalid grid configuration: {0}")]
    InvalidGridConfiguration(String),

    /// No demand data, or no cell survived the traffic floor.
    #[error("empty candidate set: {0}")]
    EmptyCandidateSet(String),

    /// Proximity cannot be measured without existing facilities.
    #[error("no existing facilities supplied")]
    EmptyFacilitySet,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for SiteError {
    fn from(err: serde_json::Error) -> Self {
        SiteError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SiteError {
    fn from(err: std::io::Error) -> Self {
        SiteError::Io(err.to_string())
    }
}
