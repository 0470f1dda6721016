use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::info;

use super::{
    Media, MediaChanges, MediaRepository, NewMedia, NewUser, Page, StoreError, User, UserChanges,
    UserFilter, UserRepository,
};
use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        username    TEXT NOT NULL UNIQUE,
        email       TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        role        TEXT NOT NULL DEFAULT 'user',
        api_key     TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS medias (
        id            BIGSERIAL PRIMARY KEY,
        owner_id      BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        filename      TEXT NOT NULL,
        mimetype      TEXT NOT NULL,
        size          BIGINT NOT NULL,
        url           TEXT NOT NULL,
        storage_path  TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS medias_owner_id_idx ON medias (owner_id)",
];

/// Open a pool and make sure the tables exist
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not configured".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;

    ensure_schema(&pool).await?;
    info!("Connected to Postgres ({} max connections)", config.max_connections);
    Ok(pool)
}

pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Unique violations become conflicts, everything else stays a sqlx error
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: String,
    api_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e: String| StoreError::Sqlx(sqlx::Error::Decode(e.into())))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            role,
            api_key: row.api_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
            medias: Vec::new(),
        })
    }
}

fn into_users(rows: Vec<UserRow>) -> Result<Vec<User>, StoreError> {
    rows.into_iter().map(User::try_from).collect()
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self, filter: &UserFilter, page: Page) -> Result<(Vec<User>, i64), StoreError> {
        let role = filter.role.map(|r| r.as_str());

        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT * FROM users WHERE ($1::text IS NULL OR role = $1) ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(role)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR role = $1)")
                .bind(role)
                .fetch_one(&self.pool)
                .await?;

        Ok((into_users(rows)?, total))
    }

    async fn find(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE username = $1 OR email = $1 LIMIT 1")
                .bind(login)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, password, role, api_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(&user.api_key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        row.try_into()
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users SET
                username   = COALESCE($2, username),
                email      = COALESCE($3, email),
                password   = COALESCE($4, password),
                role       = COALESCE($5, role),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password)
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.ok_or_else(|| StoreError::NotFound(format!("user {} not found", id)))?
            .try_into()
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {} not found", id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn list(&self, owner_id: Option<i64>, page: Page) -> Result<(Vec<Media>, i64), StoreError> {
        let rows: Vec<Media> = sqlx::query_as(
            "SELECT * FROM medias WHERE ($1::bigint IS NULL OR owner_id = $1) ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM medias WHERE ($1::bigint IS NULL OR owner_id = $1)",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn by_owner(&self, owner_id: i64) -> Result<Vec<Media>, StoreError> {
        let rows = sqlx::query_as("SELECT * FROM medias WHERE owner_id = $1 ORDER BY id")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Media>, StoreError> {
        let row = sqlx::query_as("SELECT * FROM medias WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, media: NewMedia) -> Result<Media, StoreError> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO medias (owner_id, filename, mimetype, size, url, storage_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(media.owner_id)
        .bind(&media.filename)
        .bind(&media.mimetype)
        .bind(media.size)
        .bind(&media.url)
        .bind(&media.storage_path)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(row)
    }

    async fn update(&self, id: i64, changes: MediaChanges) -> Result<Media, StoreError> {
        let row: Option<Media> = sqlx::query_as(
            r#"
            UPDATE medias SET
                filename   = COALESCE($2, filename),
                mimetype   = COALESCE($3, mimetype),
                size       = COALESCE($4, size),
                url        = COALESCE($5, url),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.filename)
        .bind(changes.mimetype)
        .bind(changes.size)
        .bind(changes.url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.ok_or_else(|| StoreError::NotFound(format!("media {} not found", id)))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM medias WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("media {} not found", id)));
        }
        Ok(())
    }

    async fn delete_by_owner(&self, owner_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM medias WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
