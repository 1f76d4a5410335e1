//! Service errors
//!
//! Every service returns [`ServiceError`]. The message is the text shown to
//! API callers, so variants carry it verbatim.

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid input (400)
    #[error("{0}")]
    Validation(String),

    /// Missing or rejected credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Target document does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness rule violated (409)
    #[error("{0}")]
    Conflict(String),

    /// Storage or other infrastructure failure (500)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_verbatim() {
        assert_eq!(
            ServiceError::validation("email is required").to_string(),
            "email is required"
        );
        let internal: ServiceError = anyhow::anyhow!("disk full").into();
        assert_eq!(internal.to_string(), "disk full");
    }
}
