/// User model and database operations
///
/// User ids are issued by the external identity provider and supplied by the
/// client on creation; the server never generates them. Emails are unique and
/// stored lowercase.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email VARCHAR(320) NOT NULL UNIQUE,
///     name VARCHAR(255),
///     avatar_url VARCHAR(1024),
///     is_super_user BOOLEAN NOT NULL DEFAULT FALSE,
///     meta JSONB,
///     last_seen TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     id: Uuid::new_v4(),
///     email: "alice@example.com".to_string(),
///     name: Some("Alice".to_string()),
///     avatar_url: None,
///     is_super_user: false,
///     meta: None,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "Alice@Example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// User account mirrored from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity provider's user id
    pub id: Uuid,

    /// Lowercased email address, unique across users
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Optional avatar URL
    pub avatar_url: Option<String>,

    /// Super users see the admin toggle in the dashboard
    pub is_super_user: bool,

    /// Free-form client metadata
    pub meta: Option<JsonValue>,

    /// Last time the dashboard reported the user active
    pub last_seen: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public face of a user embedded in other resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_super_user: bool,
    pub meta: Option<JsonValue>,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written. Nullable columns use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub is_super_user: Option<bool>,
    pub meta: Option<Option<JsonValue>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.avatar_url.is_none()
            && self.is_super_user.is_none()
            && self.meta.is_none()
            && self.last_seen.is_none()
    }
}

/// Canonical form in which emails are stored and compared
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is
    /// taken, or on the primary key when the id already exists.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, avatar_url, is_super_user, meta)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, name, avatar_url, is_super_user, meta, last_seen,
                      created_at, updated_at
            "#,
        )
        .bind(data.id)
        .bind(normalize_email(&data.email))
        .bind(data.name)
        .bind(data.avatar_url)
        .bind(data.is_super_user)
        .bind(data.meta)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, is_super_user, meta, last_seen,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email, ignoring case and surrounding whitespace
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, is_super_user, meta, last_seen,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether a user exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Lists all users, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, avatar_url, is_super_user, meta, last_seen,
                   created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Updates a user
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${}", bind_count));
        }
        if data.is_super_user.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_super_user = ${}", bind_count));
        }
        if data.meta.is_some() {
            bind_count += 1;
            query.push_str(&format!(", meta = ${}", bind_count));
        }
        if data.last_seen.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_seen = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, email, name, avatar_url, is_super_user, meta, last_seen, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }
        if let Some(is_super_user) = data.is_super_user {
            q = q.bind(is_super_user);
        }
        if let Some(meta) = data.meta {
            q = q.bind(meta);
        }
        if let Some(last_seen) = data.last_seen {
            q = q.bind(last_seen);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user
    ///
    /// Memberships, comments, notifications and activity entries of the user
    /// go with it; assignments are cleared. Fails with a foreign key
    /// violation while the user still owns projects or authored tasks.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl UserSummary {
    /// Loads summaries for a set of user ids
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, avatar_url FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}
