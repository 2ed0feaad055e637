/*
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - Conflict は users.username の一意制約違反 (登録の競合) を表す
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("unique constraint violated")]
    Conflict,
}

impl RepoError {
    /// Use on INSERTs that can race on a unique key: 23505 becomes `Conflict`.
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
