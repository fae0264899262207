use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::UserRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::executor::WriteExecutor;
use crate::live::{ChangeNotifier, Table};
use crate::models::{Role, User};
use crate::password::{check_policy, hash_password, temporary_password, verify_password};

/// Where a successful login leads.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(User),
    /// Credentials are valid but the account is flagged; the user must go
    /// through the password change flow first.
    PasswordChangeRequired(User),
}

impl LoginOutcome {
    pub fn user(&self) -> &User {
        match self {
            LoginOutcome::Authenticated(user) | LoginOutcome::PasswordChangeRequired(user) => user,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    executor: Arc<WriteExecutor>,
    notifier: ChangeNotifier,
}

impl UserService {
    pub fn new(repo: UserRepository, executor: Arc<WriteExecutor>, notifier: ChangeNotifier) -> Self {
        Self {
            repo,
            executor,
            notifier,
        }
    }

    /// Create an account flagged to change its password on first login.
    /// Without `password` a temporary one is generated. Returns the user and
    /// the password to hand over.
    pub async fn create_user(
        &self,
        username: &str,
        full_name: &str,
        role: Role,
        password: Option<String>,
    ) -> ServiceResult<(User, String)> {
        let username = username.trim().to_string();
        let full_name = full_name.trim().to_string();
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                if username.is_empty() {
                    return Err(ServiceError::invalid("Username is required"));
                }
                let password = password.unwrap_or_else(temporary_password);
                check_policy(&password)?;

                if repo.get_by_username(&username).await?.is_some() {
                    return Err(ServiceError::UsernameTaken(username));
                }

                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    username: username.clone(),
                    full_name,
                    role,
                    must_change_password: true,
                    created_at: now,
                    updated_at: now,
                };

                let created = repo
                    .create(&user, &hash_password(&password)?)
                    .await
                    .map_err(ServiceError::from)
                    .map_err(|e| {
                        if e.is_unique_violation() {
                            ServiceError::UsernameTaken(username.clone())
                        } else {
                            e
                        }
                    })?;

                notifier.notify(Table::Users);
                tracing::info!(username = %created.username, role = %created.role, "user created");
                Ok((created, password))
            })
            .wait()
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let Some((user, stored)) = self.repo.credentials(username.trim()).await? else {
            tracing::warn!(username = %username.trim(), "login for unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &stored) {
            tracing::warn!(username = %user.username, "login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(username = %user.username, "login");
        if user.must_change_password {
            Ok(LoginOutcome::PasswordChangeRequired(user))
        } else {
            Ok(LoginOutcome::Authenticated(user))
        }
    }

    /// Verify `current`, store `new_password` and clear the change flag.
    pub async fn change_password(
        &self,
        username: &str,
        current: &str,
        new_password: &str,
    ) -> ServiceResult<User> {
        let username = username.trim().to_string();
        let current = current.to_string();
        let new_password = new_password.to_string();
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let (user, stored) = repo
                    .credentials(&username)
                    .await?
                    .ok_or(ServiceError::InvalidCredentials)?;
                if !verify_password(&current, &stored) {
                    return Err(ServiceError::InvalidCredentials);
                }
                check_policy(&new_password)?;
                if new_password == current {
                    return Err(ServiceError::PasswordUnchanged);
                }

                repo.update_password(user.id, &hash_password(&new_password)?, false)
                    .await?;
                notifier.notify(Table::Users);
                tracing::info!(username = %user.username, "password changed");

                repo.get_by_username(&username)
                    .await?
                    .ok_or(ServiceError::UserNotFound(username))
            })
            .wait()
            .await
    }

    /// Issue a temporary password and flag the account.
    pub async fn reset_password(&self, username: &str) -> ServiceResult<String> {
        let username = username.trim().to_string();
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let user = repo
                    .get_by_username(&username)
                    .await?
                    .ok_or_else(|| ServiceError::UserNotFound(username.clone()))?;

                let password = temporary_password();
                repo.update_password(user.id, &hash_password(&password)?, true)
                    .await?;
                notifier.notify(Table::Users);
                tracing::info!(username = %user.username, "password reset");
                Ok(password)
            })
            .wait()
            .await
    }

    pub async fn delete_user(&self, username: &str) -> ServiceResult<()> {
        let username = username.trim().to_string();
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                if !repo.delete(&username).await? {
                    return Err(ServiceError::UserNotFound(username));
                }
                notifier.notify(Table::Users);
                tracing::info!(username = %username, "user deleted");
                Ok(())
            })
            .wait()
            .await
    }

    pub async fn get_user(&self, username: &str) -> ServiceResult<User> {
        self.repo
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(username.trim().to_string()))
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.list().await?)
    }

    /// Gate for main operations: the user must exist and must not be
    /// waiting on a password change.
    pub async fn require_active(&self, username: &str) -> ServiceResult<User> {
        let user = self.get_user(username).await?;
        if user.must_change_password {
            return Err(ServiceError::PasswordChangeRequired);
        }
        Ok(user)
    }
}
