/*
 * Responsibility
 * - 全レスポンス共通の envelope: {"success": bool, "data": T | null, "message": string | null}
 * - handler は ApiResponse::ok(..) を返し、エラーは AppError 側で error(..) を組み立てる
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_keeps_null_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error("No autenticado")).unwrap();

        assert_eq!(
            body,
            serde_json::json!({"success": false, "data": null, "message": "No autenticado"})
        );
    }
}
