/*
 * Responsibility
 * - users / roles / user_roles テーブル向け SQLx 操作
 * - handler からは UserStore trait 越しに使う (テストでは in-memory 実装に差し替え)
 * - DB エラーは RepoError に変換して返す
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::api::v1::extractors::AuthCtx;
use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::policy::RoleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Activo,
    Inactivo,
    Suspendido,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activo => "Activo",
            Self::Inactivo => "Inactivo",
            Self::Suspendido => "Suspendido",
        }
    }
}

impl TryFrom<String> for UserStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Activo" => Ok(Self::Activo),
            "Inactivo" => Ok(Self::Inactivo),
            "Suspendido" => Ok(Self::Suspendido),
            _ => Err(format!("unknown user status: {value}")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub nombre_completo: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub password_salt: String,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub numero_empleado: Option<String>,
    pub area_id: Option<i32>,
    pub area_nombre: Option<String>,
    pub ultimo_inicio_sesion: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
}

impl UserRow {
    pub fn auth_ctx(&self) -> AuthCtx {
        AuthCtx {
            user_id: self.id,
            username: self.username.clone(),
            full_name: Some(self.nombre_completo.clone()),
            roles: RoleSet::new(self.roles.iter().cloned()),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: i32,
    pub nombre: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub nombre_completo: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub password_salt: String,
    pub numero_empleado: Option<String>,
    pub telefono: Option<String>,
    pub area_id: Option<i32>,
    pub role_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>>;

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<UserRow>>;

    async fn username_exists(&self, username: &str) -> RepoResult<bool>;

    /// Roles whose id is in `ids`; unknown ids are simply missing from the result.
    async fn find_roles(&self, ids: &[i32]) -> RepoResult<Vec<RoleRow>>;

    /// Roles whose name is in `names`.
    async fn find_roles_by_names(&self, names: &[&str]) -> RepoResult<Vec<RoleRow>>;

    async fn count_users(&self) -> RepoResult<i64>;

    /// Insert the user and its role links atomically. Returns the new id.
    async fn create(&self, user: NewUser) -> RepoResult<i32>;

    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        password_salt: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<bool>;

    async fn touch_last_login(&self, id: i32, now: DateTime<Utc>) -> RepoResult<()>;

    /// Round-trip to the backing store (health check).
    async fn ping(&self) -> RepoResult<()>;
}

const SELECT_USER: &str = r#"
    SELECT
        u.id, u.nombre_completo, u.username, u.email,
        u.password_hash, u.password_salt, u.status,
        u.numero_empleado, u.area_id,
        a.nombre AS area_nombre,
        u.ultimo_inicio_sesion,
        COALESCE(
            array_agg(r.nombre ORDER BY r.nombre) FILTER (WHERE r.id IS NOT NULL),
            '{}'
        ) AS roles
    FROM users u
    LEFT JOIN areas a ON a.id = u.area_id
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let sql = format!("{SELECT_USER} WHERE u.username = $1 GROUP BY u.id, a.nombre");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<UserRow>> {
        let sql = format!("{SELECT_USER} WHERE u.id = $1 GROUP BY u.id, a.nombre");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_roles(&self, ids: &[i32]) -> RepoResult<Vec<RoleRow>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, nombre
            FROM roles
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_roles_by_names(&self, names: &[&str]) -> RepoResult<Vec<RoleRow>> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, nombre
            FROM roles
            WHERE nombre = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&names)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_users(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, user: NewUser) -> RepoResult<i32> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (
                nombre_completo, username, email, password_hash, password_salt,
                status, numero_empleado, telefono, area_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, 'Activo', $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&user.nombre_completo)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(&user.numero_empleado)
        .bind(&user.telefono)
        .bind(user.area_id)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepoError::from_sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, role_id FROM UNNEST($2::int[]) AS t(role_id)
            "#,
        )
        .bind(id)
        .bind(&user.role_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        password_salt: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_salt = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(password_salt)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_login(&self, id: i32, now: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET ultimo_inicio_sesion = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
