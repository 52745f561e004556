use thiserror::Error;

/// Core error types for MentorHub cache operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown cache namespace: {0}")]
    UnknownNamespace(String),

    #[error("Invalid tenant code: {0}")]
    InvalidTenantCode(String),

    #[error("Invalid organization code: {0}")]
    InvalidOrganizationCode(String),

    #[error("Invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Create a new UnknownNamespace error
    pub fn unknown_namespace(name: impl Into<String>) -> Self {
        Self::UnknownNamespace(name.into())
    }

    /// Create a new InvalidTenantCode error
    pub fn invalid_tenant_code(code: impl Into<String>) -> Self {
        Self::InvalidTenantCode(code.into())
    }

    /// Create a new InvalidOrganizationCode error
    pub fn invalid_organization_code(code: impl Into<String>) -> Self {
        Self::InvalidOrganizationCode(code.into())
    }

    /// Create a new InvalidEntityId error
    pub fn invalid_entity_id(id: impl Into<String>) -> Self {
        Self::InvalidEntityId(id.into())
    }

    /// Create a new Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownNamespace(_)
                | Self::InvalidTenantCode(_)
                | Self::InvalidOrganizationCode(_)
                | Self::InvalidEntityId(_)
        )
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownNamespace(_) => ErrorCategory::UnknownNamespace,
            Self::InvalidTenantCode(_)
            | Self::InvalidOrganizationCode(_)
            | Self::InvalidEntityId(_) => ErrorCategory::Validation,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    UnknownNamespace,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::UnknownNamespace => write!(f, "unknown_namespace"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
