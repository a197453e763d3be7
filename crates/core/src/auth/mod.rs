pub mod credentials;
pub mod directory;
pub mod error;

use credentials::CredentialVerifier;
use directory::{InsertOutcome, UserDirectory, UserRecord};
use error::AuthError;
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<String>,
}

impl AuthState {
    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            user: Some(username.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct AuthService<D, V> {
    directory: D,
    verifier: V,
}

impl<D: UserDirectory, V: CredentialVerifier> AuthService<D, V> {
    pub fn new(directory: D, verifier: V) -> Self {
        Self {
            directory,
            verifier,
        }
    }

    /// `Ok(false)` for unknown users and wrong passwords alike.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let Some(user) = self.directory.find_by_username(username).await? else {
            tracing::info!(%username, "login rejected: unknown user");
            return Ok(false);
        };

        let ok = self.verifier.verify(password, &user.password_hash);
        if ok {
            tracing::info!(%username, "login accepted");
        } else {
            tracing::info!(%username, "login rejected: bad credentials");
        }
        Ok(ok)
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<bool, AuthError> {
        validate_signup(username, email, password)?;

        if self.directory.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.directory.email_taken(email).await? {
            return Err(AuthError::EmailTaken);
        }

        // A concurrent signup can still win between the checks above and the insert.
        let password_hash = self.verifier.hash(password)?;
        let outcome = self
            .directory
            .insert(UserRecord {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;
        match outcome {
            InsertOutcome::Inserted => {}
            InsertOutcome::UsernameTaken => return Err(AuthError::UsernameTaken),
            InsertOutcome::EmailTaken => return Err(AuthError::EmailTaken),
        }

        tracing::info!(%username, "user registered");
        Ok(true)
    }
}

pub fn validate_signup(username: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_username(username) {
        return Err(AuthError::InvalidUsername);
    }
    if !is_valid_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

fn is_valid_username(username: &str) -> bool {
    (3..=20).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// local@domain.tld, no whitespace and exactly one '@'.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
