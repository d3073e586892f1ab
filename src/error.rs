use thiserror::Error;

/// Rejection of a submitted production record. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField { field, reason: reason.into() }
    }

    /// Name of the offending field, when the error concerns one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(f) => Some(f),
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::MalformedBody(_) => None,
        }
    }
}

/// Errors surfaced at the request boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        assert_eq!(
            ValidationError::MissingField("oreProcessed").to_string(),
            "Missing field: oreProcessed"
        );
        let err = ValidationError::invalid("workers", "must be a positive integer");
        assert_eq!(err.to_string(), "Invalid field workers: must be a positive integer");
        assert_eq!(err.field(), Some("workers"));
    }

    #[test]
    fn test_anyhow_becomes_internal() {
        let err: AppError = anyhow::anyhow!("lock poisoned").into();
        assert!(matches!(err, AppError::Internal(ref m) if m == "lock poisoned"));
    }
}
