//! In-memory `UserStore` for handler and pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{NewUser, RoleRow, UserRow, UserStatus, UserStore};
use crate::services::auth::{password, policy::roles};

pub struct MemoryUserStore {
    users: Mutex<Vec<UserRow>>,
    roles: Vec<RoleRow>,
}

impl MemoryUserStore {
    /// Store seeded with the plant roles (ids 1..=5) and no users.
    pub fn with_default_roles() -> Self {
        Self::with_roles(&roles::ALL)
    }

    /// Store seeded with the given role names, numbered from 1.
    pub fn with_roles(names: &[&str]) -> Self {
        let roles = names
            .iter()
            .enumerate()
            .map(|(i, nombre)| RoleRow {
                id: i as i32 + 1,
                nombre: nombre.to_string(),
            })
            .collect();

        Self {
            users: Mutex::new(Vec::new()),
            roles,
        }
    }

    /// Add a user with a freshly salted password. Returns its id.
    pub fn add_user(
        &self,
        username: &str,
        plain_password: &str,
        status: UserStatus,
        role_names: &[&str],
    ) -> i32 {
        let salt = password::generate_salt();
        let mut users = self.users.lock().unwrap();
        let id = users.len() as i32 + 1;
        users.push(UserRow {
            id,
            nombre_completo: format!("Usuario {username}"),
            username: username.to_string(),
            email: None,
            password_hash: password::hash(plain_password, &salt),
            password_salt: salt,
            status,
            numero_empleado: None,
            area_id: None,
            area_nombre: None,
            ultimo_inicio_sesion: None,
            roles: role_names.iter().map(|r| r.to_string()).collect(),
        });
        id
    }

    pub fn get(&self, id: i32) -> Option<UserRow> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> RepoResult<Option<UserRow>> {
        Ok(self.get(id))
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().any(|u| u.username == username))
    }

    async fn find_roles(&self, ids: &[i32]) -> RepoResult<Vec<RoleRow>> {
        Ok(self
            .roles
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn find_roles_by_names(&self, names: &[&str]) -> RepoResult<Vec<RoleRow>> {
        Ok(self
            .roles
            .iter()
            .filter(|r| names.contains(&r.nombre.as_str()))
            .cloned()
            .collect())
    }

    async fn count_users(&self) -> RepoResult<i64> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn create(&self, user: NewUser) -> RepoResult<i32> {
        let roles = self
            .roles
            .iter()
            .filter(|r| user.role_ids.contains(&r.id))
            .map(|r| r.nombre.clone())
            .collect();

        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Conflict);
        }
        let id = users.len() as i32 + 1;
        users.push(UserRow {
            id,
            nombre_completo: user.nombre_completo,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            password_salt: user.password_salt,
            status: UserStatus::Activo,
            numero_empleado: user.numero_empleado,
            area_id: user.area_id,
            area_nombre: None,
            ultimo_inicio_sesion: None,
            roles,
        });
        Ok(id)
    }

    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        password_salt: &str,
        _now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.password_salt = password_salt.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: i32, now: DateTime<Utc>) -> RepoResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.ultimo_inicio_sesion = Some(now);
        }
        Ok(())
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}
