/*
 * Responsibility
 * - /auth 系の request/response DTO (wire は camelCase、既存フロントエンドと互換)
 * - validation (形式チェック) 用の validate() を持たせる
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::user_repo::UserRow;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("El nombre de usuario es requerido");
        }
        if self.password.is_empty() {
            return Err("La contraseña es requerida");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
    pub usuario: UserInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expiration: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub token: String,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub nombre_completo: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub email: Option<String>,
    pub numero_empleado: Option<String>,
    pub telefono: Option<String>,
    pub area_id: Option<i32>,
    #[serde(default)]
    pub role_ids: Vec<i32>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.nombre_completo.trim().is_empty() {
            return Err("El nombre completo es requerido");
        }
        if self.nombre_completo.chars().count() > 100 {
            return Err("El nombre completo no debe exceder 100 caracteres");
        }
        if self.username.trim().is_empty() {
            return Err("El nombre de usuario es requerido");
        }
        if self.username.chars().count() > 50 {
            return Err("El nombre de usuario no debe exceder 50 caracteres");
        }
        if self.password.is_empty() {
            return Err("La contraseña es requerida");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("La contraseña debe tener al menos 6 caracteres");
        }
        if let Some(email) = &self.email
            && email.chars().count() > 100
        {
            return Err("El correo no debe exceder 100 caracteres");
        }
        if let Some(numero) = &self.numero_empleado
            && numero.chars().count() > 20
        {
            return Err("El número de empleado no debe exceder 20 caracteres");
        }
        if let Some(telefono) = &self.telefono
            && telefono.chars().count() > 20
        {
            return Err("El teléfono no debe exceder 20 caracteres");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password_actual: String,
    #[serde(default)]
    pub nueva_password: String,
    #[serde(default)]
    pub confirmar_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.password_actual.is_empty() {
            return Err("La contraseña actual es requerida");
        }
        if self.nueva_password.chars().count() < MIN_PASSWORD_LEN {
            return Err("La contraseña debe tener al menos 6 caracteres");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserPasswordRequest {
    #[serde(default)]
    pub user_id: i32,
    #[serde(default)]
    pub nueva_password: String,
    #[serde(default)]
    pub confirmar_password: String,
}

impl ChangeUserPasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.user_id <= 0 {
            return Err("El usuario es requerido");
        }
        if self.nueva_password.chars().count() < MIN_PASSWORD_LEN {
            return Err("La contraseña debe tener al menos 6 caracteres");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i32,
    pub nombre_completo: String,
    pub username: String,
    pub email: Option<String>,
    pub numero_empleado: Option<String>,
    pub area_id: Option<i32>,
    pub area_nombre: Option<String>,
    pub roles: Vec<String>,
    pub ultimo_inicio_sesion: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserInfo {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            nombre_completo: row.nombre_completo,
            username: row.username,
            email: row.email,
            numero_empleado: row.numero_empleado,
            area_id: row.area_id,
            area_nombre: row.area_nombre,
            roles: row.roles,
            ultimo_inicio_sesion: row.ultimo_inicio_sesion,
        }
    }
}
