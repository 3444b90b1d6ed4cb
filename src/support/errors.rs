//! Error taxonomy shared by services and repositories
//!
//! Repositories are the only place where raw storage errors get classified.
//! Everything above them either passes a classified error through unchanged
//! or wraps an `Internal` one with more context via [`DomainError::context`].

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse error category, used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Unauthorized,
    Internal,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} with {field} '{value}' not found")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{}", conflict_message(entity, *field))]
    Conflict {
        entity: &'static str,
        field: Option<&'static str>,
    },

    #[error("validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The cause is reachable through `source()` only, so storage details
    /// never end up in the rendered message.
    #[error("internal error (code: {code}): {message}")]
    Internal {
        code: &'static str,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{operation} cancelled: {reason}")]
    Cancelled {
        operation: &'static str,
        reason: &'static str,
    },
}

fn conflict_message(entity: &str, field: Option<&str>) -> String {
    match field {
        Some(field) => format!("{entity} with this {field} already exists"),
        None => format!("{entity} already exists"),
    }
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, field: Option<&'static str>) -> Self {
        Self::Conflict { entity, field }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal<E>(code: &'static str, message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Internal {
            code,
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation { .. } | Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// Add context to an unclassified failure.
    ///
    /// Classified errors come back untouched; an `Internal` error becomes the
    /// source of a new `Internal` error carrying `code` and `message`.
    pub fn context(self, code: &'static str, message: impl Into<String>) -> Self {
        match self {
            Self::Internal { .. } => Self::internal(code, message, self),
            classified => classified,
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.into_iter().next() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .or_else(|| errs.first().map(|e| e.code.to_string()))
                    .unwrap_or_else(|| "invalid value".to_string());
                Self::validation(field.to_string(), message)
            }
            None => Self::BadRequest("invalid request".to_string()),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use validator::Validate;

    #[test]
    fn not_found_message_names_resource_and_key() {
        let err = DomainError::not_found("User", "id", "42");
        assert_eq!(err.to_string(), "User with id '42' not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn conflict_message_with_and_without_field() {
        assert_eq!(
            DomainError::conflict("User", Some("username")).to_string(),
            "User with this username already exists"
        );
        assert_eq!(
            DomainError::conflict("Role", None).to_string(),
            "Role already exists"
        );
    }

    #[test]
    fn internal_hides_cause_in_display_but_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = DomainError::internal("DB_ERROR", "query users failed", cause);

        assert_eq!(
            err.to_string(),
            "internal error (code: DB_ERROR): query users failed"
        );
        let source = err.source().expect("source kept");
        assert_eq!(source.to_string(), "socket closed");
    }

    #[test]
    fn context_leaves_classified_errors_alone() {
        let err = DomainError::not_found("Role", "id", "x").context("ROLE_GET", "failed to get role");
        assert!(err.is_not_found());

        let err = DomainError::conflict("User", Some("email")).context("USER_CREATE", "failed");
        assert!(err.is_conflict());
    }

    #[test]
    fn context_wraps_internal_errors() {
        let inner = DomainError::internal("DB_ERROR", "select failed", "boom");
        let err = inner.context("USER_LIST", "failed to get users");

        match &err {
            DomainError::Internal { code, message, .. } => {
                assert_eq!(*code, "USER_LIST");
                assert_eq!(message, "failed to get users");
            }
            other => panic!("unexpected {other:?}"),
        }
        let source = err.source().expect("wrapped");
        assert!(source.to_string().contains("DB_ERROR"));
    }

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
    }

    #[test]
    fn validation_errors_convert_to_field_error() {
        let errors = Sample {
            email: "nope".into(),
        }
        .validate()
        .unwrap_err();

        match DomainError::from(errors) {
            DomainError::Validation { field, .. } => assert_eq!(field, "email"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
