use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One member of the watched group, keyed by the platform's stable ID.
///
/// Display fields hold whatever the platform last reported; an empty string
/// means the value was unknown or unavailable at the time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
}

impl MemberRecord {
    pub fn new(
        member_id: impl Into<String>,
        username: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            username: username.into(),
            discriminator: discriminator.into(),
        }
    }

    /// True when there is nothing to render besides the mention.
    pub fn is_unnamed(&self) -> bool {
        self.username.is_empty() && self.discriminator.is_empty()
    }

    /// Load every persisted member, keyed by identity. Called once at startup.
    pub async fn load_all(pool: &SqlitePool) -> Result<HashMap<String, MemberRecord>, MemberError> {
        let rows: Vec<MemberRecord> =
            sqlx::query_as("SELECT member_id, username, discriminator FROM members")
                .fetch_all(pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|record| (record.member_id.clone(), record))
            .collect())
    }

    pub async fn insert(&self, pool: &SqlitePool) -> Result<(), MemberError> {
        sqlx::query("INSERT INTO members (member_id, username, discriminator) VALUES (?1, ?2, ?3)")
            .bind(&self.member_id)
            .bind(&self.username)
            .bind(&self.discriminator)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update(&self, pool: &SqlitePool) -> Result<(), MemberError> {
        sqlx::query("UPDATE members SET username = ?1, discriminator = ?2 WHERE member_id = ?3")
            .bind(&self.username)
            .bind(&self.discriminator)
            .bind(&self.member_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn remove(pool: &SqlitePool, member_id: &str) -> Result<(), MemberError> {
        sqlx::query("DELETE FROM members WHERE member_id = ?1")
            .bind(member_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
