//! Error Types for Cyntel Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Failures raised by the market-data and balance clients
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Provider recognised the request but has no matching entity
    #[error("No match for {0}")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisorError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// User-facing failure classes of a command
///
/// Carries no provider detail; that is logged where the failure happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// No argument supplied; no external call was attempted
    #[error("missing argument")]
    MissingArgument,

    /// The market-data provider has no asset for this ticker
    #[error("no asset matches '{0}'")]
    NotFound(String),

    /// A required provider call failed or returned nothing
    #[error("data unavailable")]
    DataUnavailable,

    /// Data was fetched but the narrative provider failed
    #[error("narrative unavailable")]
    NarrativeUnavailable,
}

impl CommandFailure {
    /// Short category label
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MissingArgument => "missing_argument",
            Self::NotFound(_) => "not_found",
            Self::DataUnavailable => "data_unavailable",
            Self::NarrativeUnavailable => "narrative_unavailable",
        }
    }
}

impl From<AdvisorError> for CommandFailure {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::NotFound(ticker) => Self::NotFound(ticker),
            _ => Self::DataUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_stays_not_found() {
        let failure: CommandFailure = AdvisorError::NotFound("dogwifhat".into()).into();
        assert_eq!(failure, CommandFailure::NotFound("dogwifhat".into()));
        assert_eq!(failure.category(), "not_found");
    }

    #[test]
    fn test_provider_errors_become_data_unavailable() {
        for err in [
            AdvisorError::Provider("HTTP 500".into()),
            AdvisorError::Config("missing key".into()),
            AdvisorError::Serialization(serde_json::from_str::<u8>("x").unwrap_err()),
        ] {
            assert!(!err.is_not_found());
            assert_eq!(CommandFailure::from(err), CommandFailure::DataUnavailable);
        }
    }
}
