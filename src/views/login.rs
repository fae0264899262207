use crate::error::ServiceError;
use crate::models::User;
use crate::services::{LoginOutcome, UserService};

/// Screen to show after a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Main(User),
    ChangePassword(User),
}

/// Login screen, including the forced password change that can follow it.
pub struct LoginView {
    users: UserService,
    message: Option<String>,
    /// Username and password of a login waiting on a password change.
    /// Held only until the change succeeds, fails for good, or is cancelled.
    pending: Option<(String, String)>,
}

impl LoginView {
    pub fn new(users: UserService) -> Self {
        Self {
            users,
            message: None,
            pending: None,
        }
    }

    pub fn awaiting_password_change(&self) -> bool {
        self.pending.is_some()
    }

    /// Abandon a forced password change and forget the current password.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Error from the last attempt, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub async fn submit(&mut self, username: &str, password: &str) -> Option<Destination> {
        self.message = None;
        self.pending = None;

        if username.trim().is_empty() {
            self.message = Some("Username is required".to_string());
            return None;
        }
        if password.is_empty() {
            self.message = Some("Password is required".to_string());
            return None;
        }

        match self.users.login(username, password).await {
            Ok(LoginOutcome::Authenticated(user)) => Some(Destination::Main(user)),
            Ok(LoginOutcome::PasswordChangeRequired(user)) => {
                self.pending = Some((user.username.clone(), password.to_string()));
                Some(Destination::ChangePassword(user))
            }
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    /// Finish a forced password change; only valid after `submit` routed to
    /// [`Destination::ChangePassword`].
    pub async fn change_password(&mut self, new_password: &str, confirm: &str) -> Option<Destination> {
        self.message = None;

        let Some((username, current)) = self.pending.clone() else {
            self.message = Some("Log in before changing the password".to_string());
            return None;
        };
        if new_password != confirm {
            self.message = Some("Passwords do not match".to_string());
            return None;
        }

        match self
            .users
            .change_password(&username, &current, new_password)
            .await
        {
            Ok(user) => {
                self.pending = None;
                Some(Destination::Main(user))
            }
            Err(e) => {
                // Only a rejected new password is worth another try
                if !matches!(
                    e,
                    ServiceError::PasswordTooShort(_) | ServiceError::PasswordUnchanged
                ) {
                    self.pending = None;
                }
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
