use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Error fetching data from CloudStack: {message}")]
    Upstream { message: String },

    #[error("Malformed upstream data: {message}")]
    MalformedUpstream { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn malformed_upstream(message: impl Into<String>) -> Self {
        Self::MalformedUpstream {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Message shown to the operator on the report page
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedUpstream { .. } => {
                "No usage data found or error in API response".to_string()
            }
            other => other.to_string(),
        }
    }
}
