pub mod factory;
pub mod logout_marker;
pub mod password;
pub mod policy;
pub mod token;

pub use factory::build_token_service;
pub use token::TokenService;
