use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid state transition: {0}")]
    State(String),

    #[error("Barcode {0} is completed and accepts no further changes")]
    BarcodeClosed(i32),

    #[error("Barcode {0} is already outside")]
    AlreadyOutside(i32),

    #[error("Barcode {0} is not outside")]
    NotOutside(i32),

    #[error("Mismatch: {0}")]
    Mismatch(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Stable machine-readable code, used in API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::State(_) => "state_error",
            Self::BarcodeClosed(_) => "barcode_closed",
            Self::AlreadyOutside(_) => "already_outside",
            Self::NotOutside(_) => "not_outside",
            Self::Mismatch(_) => "mismatch_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Storage(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DomainError::BarcodeClosed(1).code(), "barcode_closed");
        assert_eq!(DomainError::AlreadyOutside(1).code(), "already_outside");
        assert_eq!(DomainError::NotOutside(1).code(), "not_outside");
        assert_eq!(DomainError::Mismatch("x".into()).code(), "mismatch_error");
        assert_eq!(
            DomainError::not_found("Barcode", "id", 7).code(),
            "not_found"
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let e = DomainError::not_found("Reservation", "id", 42);
        assert_eq!(e.to_string(), "Not found: Reservation with id=42");
    }

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::State("nope".into()).is_transient());
    }
}
