use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Coarse error category for callers that only care about who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Constraint,
    NotFound,
    Infrastructure,
}

impl AppError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::ConstraintViolation(_) => ErrorKind::Constraint,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Database(_) | AppError::Pool(_) | AppError::Json(_) | AppError::Hash(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Name of the offending field for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AppError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}

// UNIQUE, FOREIGN KEY, CHECK and trigger aborts
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                tracing::warn!("Constraint violation: {}", detail);
                AppError::ConstraintViolation(detail)
            }
            other => AppError::Database(other),
        }
    }
}

// Only the first field, alphabetically, is reported.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let first = field_errors
            .iter()
            .min_by_key(|(field, _)| **field)
            .and_then(|(field, errs)| errs.first().map(|err| (*field, err)));

        match first {
            Some((field, err)) => {
                let reason = match &*err.code {
                    "length" => match err.params.get("max") {
                        Some(max) => format!("must be at most {} characters", max),
                        None => "has an invalid length".to_string(),
                    },
                    "email" => "not a valid email address".to_string(),
                    code => err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| code.to_string()),
                };
                AppError::Validation { field, reason }
            }
            None => AppError::validation("record", errors.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn validation_reports_field_and_reason() {
        let err = AppError::validation("email", "invalid format");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("email"));
        assert_eq!(err.to_string(), "Invalid email: invalid format");
    }

    #[test]
    fn unique_failure_maps_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();

        let err: AppError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();

        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn syntax_error_is_infrastructure() {
        let conn = Connection::open_in_memory().unwrap();
        let err: AppError = conn.execute("NOT SQL", []).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(err.field(), None);
    }

    #[derive(validator::Validate)]
    struct Note {
        #[validate(length(max = 5))]
        body: String,
        #[validate(length(max = 3))]
        tag: String,
    }

    #[test]
    fn validation_errors_name_first_field() {
        use validator::Validate;

        let note = Note {
            body: "ééééé".into(),
            tag: "long".into(),
        };
        let err: AppError = note.validate().unwrap_err().into();
        assert_eq!(err.field(), Some("tag"));
        assert_eq!(err.to_string(), "Invalid tag: must be at most 3 characters");

        let note = Note {
            body: "éééééé".into(),
            tag: "long".into(),
        };
        let err: AppError = note.validate().unwrap_err().into();
        assert_eq!(err.field(), Some("body"));
    }

    #[test]
    fn not_found_kind() {
        assert_eq!(
            AppError::NotFound("user 7".into()).kind(),
            ErrorKind::NotFound
        );
    }
}
