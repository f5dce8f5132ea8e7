//! User domain errors.

use thiserror::Error;

use super::models::FieldViolation;

/// Failures raised by user operations at the point of detection.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl UserError {
    /// Collapse field violations into a single InvalidInput failure.
    pub fn from_violations(violations: Vec<FieldViolation>) -> Self {
        let detail = violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ");
        UserError::InvalidInput(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_violations_message() {
        let err = UserError::from_violations(vec![
            FieldViolation::new("email", "invalid email"),
            FieldViolation::new("id", "must be >= 1"),
        ]);
        assert_eq!(err.to_string(), "email: invalid email; id: must be >= 1");
    }
}
