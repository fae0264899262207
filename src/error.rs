//! Errors surfaced to staff. Every variant's `Display` is the message shown
//! in the UI; no variant is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// One or more form fields failed validation.
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Room {0} is already occupied")]
    RoomOccupied(String),

    #[error("Patient not found")]
    PatientNotFound,

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password change required before continuing")]
    PasswordChangeRequired,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("New password must be different from the current password")]
    PasswordUnchanged,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Item '{0}' not found")]
    ItemNotFound(String),

    #[error("Item '{name}' already exists in category {category}")]
    ItemExists { name: String, category: String },

    #[error("'{name}' is not a {expected}")]
    WrongCategory { name: String, expected: String },

    #[error("'{0}' is not ADA-friendly")]
    NotAdaFriendly(String),

    #[error("{0} already has a selection")]
    SelectionNotEmpty(String),

    #[error("No items selected for {0}")]
    EmptySelection(String),

    #[error("An order already exists for {meal} on {date}")]
    OrderExists { meal: String, date: String },

    #[error("Order not found")]
    OrderNotFound,

    #[error("Order is already finalized")]
    OrderFinalized,

    #[error("Background worker unavailable")]
    WorkerUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Invalid(vec![message.into()])
    }

    pub(crate) fn is_unique_violation(&self) -> bool {
        matches!(self, ServiceError::Database(sqlx::Error::Database(db)) if db.is_unique_violation())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
