use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Username must be 3-20 characters long and contain only letters, numbers, and underscores")]
    InvalidUsername,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Directory(#[from] anyhow::Error),
}

impl AuthError {
    /// True for the "already registered" family of signup failures.
    pub fn is_already_taken(&self) -> bool {
        matches!(self, AuthError::UsernameTaken | AuthError::EmailTaken)
    }
}
