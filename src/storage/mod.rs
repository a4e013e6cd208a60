//! SQLite-backed quota store
//!
//! One row per user tracks predictions consumed today and referrals earned.
//! Daily counters reset lazily: the first access on a later UTC date zeroes
//! `daily_used` before answering.

use crate::error::Result;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::{Path, PathBuf};


const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        daily_used INTEGER DEFAULT 0,
        referrals INTEGER DEFAULT 0,
        last_updated TEXT DEFAULT (date('now'))
    )
"#;

/// Stored quota record for one user
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserQuota {
    pub user_id: i64,
    pub daily_used: i64,
    pub referrals: i64,
    pub last_updated: NaiveDate,
}

impl UserQuota {
    /// Remaining predictions as of `today`, treating an older record as already reset
    pub fn remaining_on(&self, daily_limit: i64, today: NaiveDate) -> i64 {
        let used = if self.last_updated < today { 0 } else { self.daily_used };
        (daily_limit - used).max(0)
    }
}

/// Per-user daily prediction quota
pub struct QuotaStore {
    pool: SqlitePool,
    path: PathBuf,
    daily_limit: i64,
    referral_bonus: i64,
}

/// Current UTC calendar date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl QuotaStore {
    /// Open (or create) the store at `path`.
    ///
    /// A file that cannot be opened as a database is deleted and recreated
    /// from scratch; its contents are lost.
    pub async fn open(path: impl AsRef<Path>, daily_limit: i64, referral_bonus: i64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = match Self::connect(&path).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Database initialization error: {}", e);
                if path.exists() {
                    tracing::warn!("Recreating quota database at {}", path.display());
                    tokio::fs::remove_file(&path).await?;
                }
                Self::connect(&path).await?
            }
        };

        tracing::info!("Quota store initialized at {}", path.display());

        Ok(Self {
            pool,
            path,
            daily_limit,
            referral_bonus,
        })
    }

    async fn connect(path: &Path) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        if let Err(e) = sqlx::query(CREATE_USERS_TABLE).execute(&pool).await {
            pool.close().await;
            return Err(e.into());
        }

        Ok(pool)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn daily_limit(&self) -> i64 {
        self.daily_limit
    }

    pub fn referral_bonus(&self) -> i64 {
        self.referral_bonus
    }

    /// Remaining predictions for today.
    ///
    /// Fails open: any storage error yields the configured daily limit.
    pub async fn get_remaining(&self, user_id: i64) -> i64 {
        match self.try_remaining_on(user_id, today()).await {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::error!("Error getting quota for user {}: {}", user_id, e);
                self.daily_limit
            }
        }
    }

    /// Remaining predictions as of `today`, creating or resetting the record as needed
    pub async fn try_remaining_on(&self, user_id: i64, today: NaiveDate) -> Result<i64> {
        let row = self.user_stats(user_id).await?;

        match row {
            None => {
                sqlx::query(
                    "INSERT OR IGNORE INTO users (user_id, daily_used, last_updated) VALUES (?, 0, ?)",
                )
                .bind(user_id)
                .bind(today)
                .execute(&self.pool)
                .await?;

                tracing::debug!("Created quota record for user {}", user_id);
                Ok(self.daily_limit)
            }
            Some(record) if record.last_updated < today => {
                sqlx::query("UPDATE users SET daily_used = 0, last_updated = ? WHERE user_id = ?")
                    .bind(today)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;

                tracing::debug!("Reset daily quota for user {}", user_id);
                Ok(self.daily_limit)
            }
            Some(record) => Ok(record.remaining_on(self.daily_limit, today)),
        }
    }

    /// Add `count` to the user's consumed predictions. Never fails; errors are logged.
    pub async fn record_usage(&self, user_id: i64, count: i64) {
        match self.try_record_usage(user_id, count).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("No quota record for user {}, usage not recorded", user_id),
            Err(e) => tracing::error!("Error updating usage for user {}: {}", user_id, e),
        }
    }

    /// Returns whether a record was updated
    pub async fn try_record_usage(&self, user_id: i64, count: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET daily_used = daily_used + ? WHERE user_id = ?")
            .bind(count)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Credit a referral to `referrer_id`. Never fails; errors are logged.
    pub async fn apply_referral(&self, referrer_id: i64) {
        match self.try_apply_referral(referrer_id).await {
            Ok(true) => tracing::info!("Referral bonus applied to user {}", referrer_id),
            Ok(false) => tracing::warn!("Referrer {} has no quota record, bonus skipped", referrer_id),
            Err(e) => tracing::error!("Error adding referral for user {}: {}", referrer_id, e),
        }
    }

    /// Bump the referral count and forgive up to one bonus worth of usage, floored at 0
    pub async fn try_apply_referral(&self, referrer_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users
             SET referrals = referrals + 1,
                 daily_used = MAX(daily_used - ?, 0)
             WHERE user_id = ?",
        )
        .bind(self.referral_bonus)
        .bind(referrer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stored record for a user, without creating or resetting it
    pub async fn user_stats(&self, user_id: i64) -> Result<Option<UserQuota>> {
        let row = sqlx::query_as::<_, UserQuota>(
            "SELECT user_id, daily_used, referrals, last_updated FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Number of stored users; doubles as a connectivity check
    pub async fn ping(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
