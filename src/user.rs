use argon2::{
    Argon2, PasswordVerifier,
    password_hash::{PasswordHash, PasswordHasher, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

pub async fn create_user(
    database: &SqlitePool,
    name: String,
    email: String,
    password: String,
) -> Result<i64, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    let result = sqlx::query("INSERT INTO user (name, email, password) VALUES (?, ?, ?)")
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .execute(database)
        .await;
    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::Validation("email is already registered".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(
    database: &SqlitePool,
    email: String,
    password: String,
) -> Result<i64, AppError> {
    let invalid = || AppError::Unauthorized("invalid email or password".to_string());
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password FROM user WHERE email = ?")
            .bind(&email)
            .fetch_optional(database)
            .await?;
    let (id, stored_hash) = row.ok_or_else(invalid)?;
    let parsed_hash = PasswordHash::new(&stored_hash)
        .map_err(|e| anyhow::anyhow!("failed to parse password hash: {e}"))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;
    Ok(id)
}

pub async fn get_user_info(database: &SqlitePool, id: i64) -> Result<UserInfo, AppError> {
    let row: Option<(i64, String, String)> =
        sqlx::query_as("SELECT id, name, email FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(database)
            .await?;
    let (id, name, email) = row.ok_or(AppError::NotFound)?;
    Ok(UserInfo { id, name, email })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory_pool;

    #[tokio::test]
    async fn create_login_roundtrip() {
        let database = memory_pool().await.unwrap();
        let id = create_user(
            &database,
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "hunter2hunter2".to_string(),
        )
        .await
        .unwrap();

        let logged_in = login(
            &database,
            "ada@example.com".to_string(),
            "hunter2hunter2".to_string(),
        )
        .await
        .unwrap();
        assert_eq!(id, logged_in);

        let info = get_user_info(&database, id).await.unwrap();
        assert_eq!(info.email, "ada@example.com");
        assert_eq!(info.name, "Ada");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let database = memory_pool().await.unwrap();
        create_user(
            &database,
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "correct".to_string(),
        )
        .await
        .unwrap();

        let result = login(&database, "ada@example.com".to_string(), "wrong".to_string()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let result = login(&database, "nobody@example.com".to_string(), "x".to_string()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let database = memory_pool().await.unwrap();
        create_user(
            &database,
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "pw".to_string(),
        )
        .await
        .unwrap();
        let result = create_user(
            &database,
            "Ada Again".to_string(),
            "ada@example.com".to_string(),
            "pw".to_string(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
