/*
 * Responsibility
 * - API の版ごとの routes と共通部品 (envelope, SecuredRouter)
 */
pub mod response;
pub mod secured_router;
pub mod v1;
