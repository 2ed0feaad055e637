/*
 * Responsibility
 * - /auth 系 handler (login / refresh-token / logout / register / change-password /
 *   change-user-password / me)
 * - DTO validation → UserStore / TokenService 呼び出し → ApiResponse envelope
 * - 認可 (誰が叩けるか) は route 登録時の policy と gate の責務。ここでは判定しない
 */
use std::collections::BTreeSet;

use axum::{Json, extract::State};
use chrono::Utc;

use crate::{
    api::response::ApiResponse,
    api::v1::dto::auth::{
        ChangePasswordRequest, ChangeUserPasswordRequest, LoginRequest, LoginResponse,
        LogoutResponse, RegisterRequest, TokenResponse, UserInfo,
    },
    api::v1::extractors::{AppJson, CurrentUser},
    error::AppError,
    repos::user_repo::{NewUser, UserStatus},
    services::auth::{password, policy::roles},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Usuario o contraseña incorrectos";
const USER_NOT_FOUND: &str = "Usuario no encontrado";
const PASSWORD_UPDATED: &str = "Contraseña actualizada correctamente";

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let Some(mut user) = state.users.find_by_username(req.username.trim()).await? else {
        tracing::info!(username = %req.username, "login failed: unknown user");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !password::verify(&req.password, &user.password_salt, &user.password_hash) {
        tracing::info!(user_id = user.id, "login failed: wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    if user.status != UserStatus::Activo {
        tracing::info!(user_id = user.id, status = user.status.as_str(), "login refused");
        return Err(AppError::unauthorized("Usuario inactivo o suspendido"));
    }

    let now = Utc::now();
    state.users.touch_last_login(user.id, now).await?;
    user.ultimo_inicio_sesion = Some(now);

    let issued = state.tokens.issue_access_token(&user.auth_ctx())?;
    tracing::info!(user_id = user.id, "login succeeded");

    Ok(Json(ApiResponse::ok(LoginResponse {
        token: issued.token,
        expiration: issued.expires_at,
        usuario: UserInfo::from(user),
    })))
}

/// Re-reads the user so role changes since the last login land in the new token.
pub async fn refresh_token(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let user = state
        .users
        .find_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized(USER_NOT_FOUND))?;

    let issued = state.tokens.issue_access_token(&user.auth_ctx())?;

    Ok(Json(ApiResponse::ok(TokenResponse {
        token: issued.token,
        expiration: issued.expires_at,
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<LogoutResponse>>, AppError> {
    let token = state.tokens.issue_logout_token()?;
    tracing::info!(user_id = ctx.user_id, "logout token issued");

    Ok(Json(ApiResponse::ok(LogoutResponse {
        token,
        message: "Sesión cerrada correctamente",
    })))
}

pub async fn register(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let username = req.username.trim().to_string();
    if state.users.username_exists(&username).await? {
        return Err(AppError::bad_request("El nombre de usuario ya está en uso"));
    }

    // 同じ id が重複していても 1 件として数える
    let role_ids: Vec<i32> = req
        .role_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let roles = state.users.find_roles(&role_ids).await?;
    if roles.len() != role_ids.len() {
        let missing: Vec<i32> = role_ids
            .iter()
            .copied()
            .filter(|id| !roles.iter().any(|r| r.id == *id))
            .collect();
        tracing::info!(?missing, "register refused: unknown role ids");
        return Err(AppError::bad_request("Uno o más roles no existen"));
    }

    let salt = password::generate_salt();
    let new_user = NewUser {
        nombre_completo: req.nombre_completo.trim().to_string(),
        username,
        email: req.email,
        password_hash: password::hash(&req.password, &salt),
        password_salt: salt,
        numero_empleado: req.numero_empleado,
        telefono: req.telefono,
        area_id: req.area_id,
        role_ids,
        created_at: Utc::now(),
    };

    let id = state.users.create(new_user).await?;
    tracing::info!(
        user_id = id,
        created_by = ctx.user_id,
        roles = ?roles.iter().map(|r| r.nombre.as_str()).collect::<Vec<_>>(),
        "user registered"
    );

    Ok(Json(ApiResponse::ok("Usuario creado exitosamente")))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let user = state
        .users
        .find_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    if !password::verify(&req.password_actual, &user.password_salt, &user.password_hash) {
        return Err(AppError::bad_request("La contraseña actual es incorrecta"));
    }
    if req.nueva_password != req.confirmar_password {
        return Err(AppError::bad_request("Las contraseñas no coinciden"));
    }

    let salt = password::generate_salt();
    let hash = password::hash(&req.nueva_password, &salt);
    if !state
        .users
        .update_password(user.id, &hash, &salt, Utc::now())
        .await?
    {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }
    tracing::info!(user_id = user.id, "password changed");

    Ok(Json(ApiResponse::ok(PASSWORD_UPDATED)))
}

/// Password reset by an administrator. Only a SuperUsuario may reset the
/// password of another SuperUsuario.
pub async fn change_user_password(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    AppJson(req): AppJson<ChangeUserPasswordRequest>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let target = state
        .users
        .find_by_id(req.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    if target.roles.iter().any(|r| r == roles::SUPER_USUARIO)
        && !ctx.roles.contains(roles::SUPER_USUARIO)
    {
        tracing::info!(
            user_id = ctx.user_id,
            target_id = target.id,
            "password reset refused: target is a SuperUsuario"
        );
        return Err(AppError::Forbidden);
    }
    if req.nueva_password != req.confirmar_password {
        return Err(AppError::bad_request("Las contraseñas no coinciden"));
    }

    let salt = password::generate_salt();
    let hash = password::hash(&req.nueva_password, &salt);
    if !state
        .users
        .update_password(target.id, &hash, &salt, Utc::now())
        .await?
    {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }
    tracing::info!(user_id = ctx.user_id, target_id = target.id, "password reset");

    Ok(Json(ApiResponse::ok(PASSWORD_UPDATED)))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    let user = state
        .users
        .find_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    Ok(Json(ApiResponse::ok(UserInfo::from(user))))
}
