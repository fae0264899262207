use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{decode_error, parse_id, parse_timestamp};
use crate::models::{Role, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    full_name: String,
    role: String,
    password_hash: String,
    must_change_password: bool,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_parts(self) -> Result<(User, String), sqlx::Error> {
        let role: Role = self.role.parse().map_err(decode_error)?;
        let user = User {
            id: parse_id(&self.id)?,
            username: self.username,
            full_name: self.full_name,
            role,
            must_change_password: self.must_change_password,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        };
        Ok((user, self.password_hash))
    }
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User, password_hash: &str) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, role, password_hash, must_change_password, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.role.to_string())
        .bind(password_hash)
        .bind(user.must_change_password)
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_by_username(&user.username)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .credentials(username)
            .await?
            .map(|(user, _)| user))
    }

    /// Look up a user together with their password hash.
    pub async fn credentials(&self, username: &str) -> Result<Option<(User, String)>, sqlx::Error> {
        // username column is COLLATE NOCASE
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_parts).transpose()
    }

    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row.into_parts().map(|(user, _)| user))
            .collect()
    }

    /// Replace the password hash; returns false if no such user exists.
    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, must_change_password = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(must_change_password)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_db, TestDb};

    struct TestContext {
        repo: UserRepository,
        _db: TestDb,
    }

    async fn setup() -> TestContext {
        let db = test_db().await;
        TestContext {
            repo: UserRepository::new(db.pool.clone()),
            _db: db,
        }
    }

    fn new_user(username: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: String::new(),
            role: Role::Staff,
            must_change_password: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn password(tag: &str) -> String {
        format!("$argon2id$v=19$m=19456,t=2,p=1$salt{}$hash", tag)
    }

    #[tokio::test]
    async fn test_create_and_lookup_case_insensitive() {
        let ctx = setup().await;

        let created = ctx.repo.create(&new_user("JDoe"), &password("a")).await.unwrap();
        assert_eq!(created.username, "JDoe");
        assert!(created.must_change_password);

        let (user, stored) = ctx.repo.credentials("jdoe").await.unwrap().unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(stored, password("a"));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let ctx = setup().await;

        ctx.repo.create(&new_user("nurse"), &password("a")).await.unwrap();
        let err = ctx
            .repo
            .create(&new_user("NURSE"), &password("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::Database(ref db) if db.is_unique_violation()));
    }

    #[tokio::test]
    async fn test_update_password_clears_flag() {
        let ctx = setup().await;

        let user = ctx.repo.create(&new_user("jdoe"), &password("a")).await.unwrap();
        assert!(ctx
            .repo
            .update_password(user.id, &password("b"), false)
            .await
            .unwrap());

        let (user, stored) = ctx.repo.credentials("jdoe").await.unwrap().unwrap();
        assert!(!user.must_change_password);
        assert_eq!(stored, password("b"));

        assert!(!ctx
            .repo
            .update_password(Uuid::new_v4(), &password("c"), false)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let ctx = setup().await;

        ctx.repo.create(&new_user("bravo"), &password("a")).await.unwrap();
        ctx.repo.create(&new_user("alpha"), &password("b")).await.unwrap();

        let users = ctx.repo.list().await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo"]);

        assert!(ctx.repo.delete("alpha").await.unwrap());
        assert!(!ctx.repo.delete("alpha").await.unwrap());
        assert_eq!(ctx.repo.list().await.unwrap().len(), 1);
    }
}
