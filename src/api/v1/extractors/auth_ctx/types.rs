/*
 * Responsibility
 * - Handler / gate から見える「リクエストの呼び出し主体」の型
 * - access middleware が署名検証後に request extensions に格納する
 *
 * Notes
 * - JWT の検証ロジックは services::auth::token 側の責務
 * - principal は 1 リクエストの間 immutable
 */
use crate::services::auth::policy::RoleSet;

/// Identity of an authenticated caller, derived from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: i32,
    pub username: String,
    pub full_name: Option<String>,
    pub roles: RoleSet,
}

/// Caller of the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(AuthCtx),
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Role set of an authenticated caller; `None` when anonymous.
    pub fn roles(&self) -> Option<&RoleSet> {
        match self {
            Self::Authenticated(ctx) => Some(&ctx.roles),
            Self::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        match self {
            Self::Authenticated(ctx) => Some(ctx.user_id),
            Self::Anonymous => None,
        }
    }
}
