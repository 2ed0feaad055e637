/*
 * Responsibility
 * - route 登録と access policy 登録を 1 回の呼び出しで行う builder
 * - 登録した (method, route template) → policy を PolicyTable に集約し、起動時に 1 度だけ確定させる
 *
 * Notes
 * - role gate は MatchedPath で table を引くため、ここで登録する path は router に渡す文字列と同一
 * - prefix 付きで登録するので nest() は使わない (MatchedPath と table のキーを一致させるため)
 */
use axum::{
    Router,
    handler::Handler,
    http::Method,
    routing::{MethodRouter, get, post},
};

use crate::services::auth::policy::{AccessPolicy, PolicyError, PolicyTable};

pub struct SecuredRouter<S = ()> {
    prefix: String,
    router: Router<S>,
    policies: PolicyTable,
}

impl<S> SecuredRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            router: Router::new(),
            policies: PolicyTable::new(),
        }
    }

    pub fn get<H, T>(self, path: &str, handler: H, policy: AccessPolicy) -> Result<Self, PolicyError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.register(Method::GET, path, get(handler), policy)
    }

    pub fn post<H, T>(self, path: &str, handler: H, policy: AccessPolicy) -> Result<Self, PolicyError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.register(Method::POST, path, post(handler), policy)
    }

    fn register(
        mut self,
        method: Method,
        path: &str,
        method_router: MethodRouter<S>,
        policy: AccessPolicy,
    ) -> Result<Self, PolicyError> {
        let full_path = format!("{}{}", self.prefix, path);

        // table 側で重複を弾いてから router に載せる (axum は同一 method の重複登録で panic する)
        self.policies.insert(method, full_path.clone(), policy)?;
        self.router = self.router.route(&full_path, method_router);
        Ok(self)
    }

    pub fn into_parts(self) -> (Router<S>, PolicyTable) {
        (self.router, self.policies)
    }
}
