use crate::auth::directory::{InsertOutcome, UserDirectory, UserRecord};
use anyhow::Context;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: sqlx::PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT username, email, password_hash FROM users WHERE username = $1 LIMIT 1",
        )
        .persistent(false)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("select users by username failed")?;

        Ok(row.map(|(username, email, password_hash)| UserRecord {
            username,
            email,
            password_hash,
        }))
    }

    async fn email_taken(&self, email: &str) -> anyhow::Result<bool> {
        let taken: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .persistent(false)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .context("select users by email failed")?;
        Ok(taken.0)
    }

    async fn insert(&self, user: UserRecord) -> anyhow::Result<InsertOutcome> {
        let res = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .persistent(false)
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(unique_conflict(db.constraint()))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("insert users failed for {}", user.username))),
        }
    }
}

// Postgres names inline UNIQUE constraints `<table>_<column>_key`.
fn unique_conflict(constraint: Option<&str>) -> InsertOutcome {
    match constraint {
        Some("users_email_key") => InsertOutcome::EmailTaken,
        _ => InsertOutcome::UsernameTaken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_map_to_the_taken_key() {
        assert_eq!(unique_conflict(Some("users_email_key")), InsertOutcome::EmailTaken);
        assert_eq!(unique_conflict(Some("users_username_key")), InsertOutcome::UsernameTaken);
    }
}
