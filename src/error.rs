use thiserror::Error;

/// Main error type for the mediation layer
#[derive(Error, Debug)]
pub enum MedleyError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Request validation errors (rejected before any state is touched)
    #[error("Missing param - {0}")]
    MissingParameter(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Network lifecycle errors
    #[error("Init failed: {0}")]
    InitFailed(String),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Show failed: {0}")]
    Show(#[from] ShowError),

    // State machine errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MedleyError
pub type Result<T> = std::result::Result<T, MedleyError>;

/// Why a placement failed to produce a ready ad
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("network init failed: {0}")]
    InitFailed(String),

    #[error("no fill: {0}")]
    NoFill(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("load blocked while placement {showing} is showing")]
    LoadWhileShowBlocked { showing: String },
}

/// Why a show request was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShowError {
    #[error("no ads to show")]
    NotAvailable,

    #[error("network error: {0}")]
    Network(String),
}

impl MedleyError {
    /// True for errors caused by the caller's input rather than the network
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            MedleyError::MissingParameter(_) | MedleyError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err = MedleyError::MissingParameter("placementId".to_string());
        assert_eq!(err.to_string(), "Missing param - placementId");
        assert!(err.is_parameter_error());
    }

    #[test]
    fn test_narrow_errors_convert() {
        let err: MedleyError = ShowError::NotAvailable.into();
        assert!(matches!(err, MedleyError::Show(ShowError::NotAvailable)));
        assert!(!err.is_parameter_error());

        let err: MedleyError = LoadError::LoadWhileShowBlocked {
            showing: "rv-1".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Load failed: load blocked while placement rv-1 is showing"
        );
    }
}
