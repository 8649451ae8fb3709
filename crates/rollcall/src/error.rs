//! Error types for rollcall.
//!
//! Every fallible operation in the crate returns [`Error`]. Callers that need
//! to react to a failure (the web layer choosing a notice, the CLI choosing an
//! exit message) classify it with [`Error::kind`] instead of matching on
//! storage internals.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// Submitted student data failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A student with this roll number is already stored.
    #[error("a student with roll number '{}' already exists", abbreviate(.roll_no))]
    DuplicateRollNo {
        /// The conflicting roll number.
        roll_no: String,
    },

    /// No student is stored under this roll number.
    #[error("student '{}' not found", abbreviate(.roll_no))]
    StudentNotFound {
        /// The roll number that was looked up.
        roll_no: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// The database holds a `students` table this version cannot use.
    #[error("database at {path} has an incompatible students table (missing columns: {missing})")]
    IncompatibleSchema {
        /// Path to the database file.
        path: PathBuf,
        /// Comma-separated names of the absent columns.
        missing: String,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Longest user-supplied value, in characters, repeated inside an error message.
pub const MAX_ECHO_CHARS: usize = 64;

/// Shorten `value` to [`MAX_ECHO_CHARS`] characters, marking the cut with `…`.
#[must_use]
pub fn abbreviate(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_ECHO_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &value[..cut])),
        None => Cow::Borrowed(value),
    }
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed input; nothing was written.
    Validation,
    /// Insert collided with an existing roll number; nothing was written.
    DuplicateKey,
    /// The target student does not exist.
    NotFound,
    /// The database or file system failed.
    Storage,
    /// Configuration could not be loaded or is invalid.
    Config,
    /// A bug or a failed background task.
    Internal,
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a duplicate roll number error.
    #[must_use]
    pub fn duplicate_roll_no(roll_no: impl Into<String>) -> Self {
        Self::DuplicateRollNo {
            roll_no: roll_no.into(),
        }
    }

    /// Create a student not found error.
    #[must_use]
    pub fn student_not_found(roll_no: impl Into<String>) -> Self {
        Self::StudentNotFound {
            roll_no: roll_no.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::DuplicateRollNo { .. } => ErrorKind::DuplicateKey,
            Self::StudentNotFound { .. } => ErrorKind::NotFound,
            Self::DatabaseOpen { .. }
            | Self::IncompatibleSchema { .. }
            | Self::DatabaseQuery(_)
            | Self::Io(_)
            | Self::DirectoryCreate { .. }
            | Self::Json(_) => ErrorKind::Storage,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error indicates a missing student.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error indicates a roll number collision.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.kind() == ErrorKind::DuplicateKey
    }

    /// Message suitable for showing to an end user.
    ///
    /// Domain errors are reported verbatim (capitalized). Everything else is
    /// prefixed with `action`, e.g. `Error adding student: ...`.
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::DuplicateKey | ErrorKind::NotFound => {
                let mut message = self.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                message
            }
            ErrorKind::Storage | ErrorKind::Config | ErrorKind::Internal => {
                format!("Error {action}: {self}")
            }
        }
    }
}

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The student's roll number.
    RollNo,
    /// The student's name.
    Name,
    /// The student's email address.
    Email,
    /// The student's contact number.
    Contact,
    /// The student's gender.
    Gender,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RollNo => write!(f, "roll number"),
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Contact => write!(f, "contact"),
            Self::Gender => write!(f, "gender"),
        }
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    /// The field was absent, empty, or whitespace only.
    Missing(Field),
    /// The gender was not one of the accepted values.
    InvalidGender(String),
}

impl FieldIssue {
    /// The field this issue refers to.
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::Missing(field) => *field,
            Self::InvalidGender(_) => Field::Gender,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "{field} is required"),
            Self::InvalidGender(value) => {
                write!(
                    f,
                    "gender must be Male or Female (got '{}')",
                    abbreviate(value)
                )
            }
        }
    }
}

/// All problems found in one submitted form, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Build a validation error from a non-empty list of issues.
    #[must_use]
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    /// The individual issues.
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Whether `field` is among the rejected fields.
    #[must_use]
    pub fn has_field(&self, field: Field) -> bool {
        self.issues.iter().any(|issue| issue.field() == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self
            .issues
            .iter()
            .any(|issue| matches!(issue, FieldIssue::Missing(_)))
        {
            write!(f, "please fill all required fields: ")?;
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = Error::duplicate_roll_no("101");
        assert_eq!(err.to_string(), "a student with roll number '101' already exists");
        assert!(err.is_duplicate());
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("short"), "short");
        let exact = "x".repeat(MAX_ECHO_CHARS);
        assert_eq!(abbreviate(&exact), exact.as_str());

        let long = "é".repeat(MAX_ECHO_CHARS + 10);
        let short = abbreviate(&long);
        assert_eq!(short.chars().count(), MAX_ECHO_CHARS + 1);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_long_roll_no_is_shortened_in_messages() {
        let roll_no = "x".repeat(3000);

        let msg = Error::duplicate_roll_no(&roll_no).to_string();
        assert!(msg.len() < 200);
        assert!(msg.ends_with("…' already exists"));

        let msg = Error::student_not_found(&roll_no).to_string();
        assert!(msg.len() < 200);

        let msg = FieldIssue::InvalidGender(roll_no).to_string();
        assert!(msg.len() < 200);
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::student_not_found("404");
        assert_eq!(err.to_string(), "student '404' not found");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_validation_lists_every_issue() {
        let err = ValidationError::new(vec![
            FieldIssue::Missing(Field::Name),
            FieldIssue::InvalidGender("other".to_string()),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("name is required"));
        assert!(msg.contains("got 'other'"));
        assert!(err.has_field(Field::Gender));
        assert!(!err.has_field(Field::Email));
    }

    #[test]
    fn test_invalid_gender_alone_has_no_required_prefix() {
        let err = ValidationError::new(vec![FieldIssue::InvalidGender("x".to_string())]);
        assert_eq!(err.to_string(), "gender must be Male or Female (got 'x')");

        let err: Error = err.into();
        assert_eq!(
            err.user_message("adding student"),
            "Gender must be Male or Female (got 'x')"
        );
    }

    #[test]
    fn test_missing_field_keeps_required_prefix() {
        let err = ValidationError::new(vec![
            FieldIssue::Missing(Field::Email),
            FieldIssue::InvalidGender("x".to_string()),
        ]);
        assert!(err
            .to_string()
            .starts_with("please fill all required fields: email is required; "));
    }

    #[test]
    fn test_validation_converts_into_error() {
        let err: Error = ValidationError::new(vec![FieldIssue::Missing(Field::RollNo)]).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("roll number is required"));
    }

    #[test]
    fn test_user_message_domain_errors_are_capitalized() {
        let err = Error::student_not_found("7");
        assert_eq!(err.user_message("updating student"), "Student '7' not found");
    }

    #[test]
    fn test_user_message_storage_errors_are_prefixed() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        let msg = err.user_message("adding student");
        assert!(msg.starts_with("Error adding student: "));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("task panicked");
        assert_eq!(err.to_string(), "internal error: task panicked");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert_eq!(err.kind(), ErrorKind::Storage);
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "bad bind address".to_string(),
        };
        assert!(err.to_string().contains("bad bind address"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
