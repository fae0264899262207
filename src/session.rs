//! The logged-in user, remembered between CLI invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use dietary::models::User;
use dietary::Dietary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            logged_in_at: Utc::now(),
        }
    }
}

pub fn load(path: &Path) -> Result<Option<Session>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read session file '{}': {}", path.display(), e))?;
    let session = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse session file '{}': {}", path.display(), e))?;
    Ok(Some(session))
}

pub fn save(path: &Path, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(session)?)?;
    Ok(())
}

/// Returns whether a session was removed.
pub fn clear(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)?;
    Ok(true)
}

/// The session's user, provided the account still exists and has no
/// pending password change.
pub async fn active_user(dietary: &Dietary, path: &Path) -> Result<User, Box<dyn std::error::Error>> {
    let session = load(path)?.ok_or("Not logged in. Run 'dietary login' first")?;
    let user = dietary.users.require_active(&session.username).await?;
    tracing::debug!(username = %user.username, "session active");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_clear() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("state").join("session.yaml");

        assert!(load(&path).unwrap().is_none());

        let session = Session::new("jdoe");
        save(&path, &session).unwrap();
        assert_eq!(load(&path).unwrap(), Some(session));

        assert!(clear(&path).unwrap());
        assert!(!clear(&path).unwrap());
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("session.yaml");
        std::fs::write(&path, "username: [").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse session file"));
    }

    #[tokio::test]
    async fn test_active_user_requires_changed_password() {
        let temp_dir = tempdir().unwrap();
        let dietary = Dietary::open(&temp_dir.path().join("test.db"), 2)
            .await
            .unwrap();
        let path = temp_dir.path().join("session.yaml");

        let err = active_user(&dietary, &path).await.unwrap_err();
        assert_eq!(err.to_string(), "Not logged in. Run 'dietary login' first");

        let (_, temporary) = dietary
            .users
            .create_user("jdoe", "Jane Doe", Default::default(), None)
            .await
            .unwrap();
        save(&path, &Session::new("jdoe")).unwrap();

        let err = active_user(&dietary, &path).await.unwrap_err();
        assert_eq!(err.to_string(), "Password change required before continuing");

        dietary
            .users
            .change_password("jdoe", &temporary, "kitchen42")
            .await
            .unwrap();
        assert_eq!(active_user(&dietary, &path).await.unwrap().username, "jdoe");

        dietary.close().await;
    }
}
