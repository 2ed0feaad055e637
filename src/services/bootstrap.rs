/*
 * Responsibility
 * - 起動時の初期データ確認: 既定 role が揃っているか
 * - users が空なら INITIAL_ADMIN_* から SuperUsuario を 1 件作る
 * - 既に user がいる場合は何もしない (再起動で上書きしない)
 */
use chrono::Utc;

use crate::config::InitialAdmin;
use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{NewUser, UserStore};
use crate::services::auth::{password, policy::roles};

#[derive(Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyInitialized,
    NotConfigured,
    MissingRole,
    AdminCreated(i32),
}

pub async fn ensure_initial_admin(
    users: &dyn UserStore,
    admin: Option<&InitialAdmin>,
) -> RepoResult<BootstrapOutcome> {
    let present = users.find_roles_by_names(&roles::ALL).await?;
    let missing: Vec<&str> = roles::ALL
        .into_iter()
        .filter(|name| !present.iter().any(|r| r.nombre == *name))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(?missing, "roles missing from the database; run the migrations");
    }

    if users.count_users().await? > 0 {
        return Ok(BootstrapOutcome::AlreadyInitialized);
    }

    let Some(admin) = admin else {
        tracing::warn!(
            "users table is empty and INITIAL_ADMIN_USERNAME/INITIAL_ADMIN_PASSWORD are not set"
        );
        return Ok(BootstrapOutcome::NotConfigured);
    };

    let Some(super_role) = present.iter().find(|r| r.nombre == roles::SUPER_USUARIO) else {
        tracing::warn!("cannot create the initial admin without the SuperUsuario role");
        return Ok(BootstrapOutcome::MissingRole);
    };

    let salt = password::generate_salt();
    let new_user = NewUser {
        nombre_completo: admin.nombre_completo.clone(),
        username: admin.username.clone(),
        email: None,
        password_hash: password::hash(&admin.password, &salt),
        password_salt: salt,
        numero_empleado: None,
        telefono: None,
        area_id: None,
        role_ids: vec![super_role.id],
        created_at: Utc::now(),
    };

    match users.create(new_user).await {
        Ok(id) => {
            tracing::info!(user_id = id, username = %admin.username, "initial admin created");
            Ok(BootstrapOutcome::AdminCreated(id))
        }
        // 複数 instance が同時に起動した場合
        Err(RepoError::Conflict) => Ok(BootstrapOutcome::AlreadyInitialized),
        Err(e) => Err(e),
    }
}
