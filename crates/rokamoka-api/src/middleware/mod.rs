//! 中间件
//!
//! Bearer Token 认证与安全响应头

mod auth;
mod security;

pub use auth::{PUBLIC_PATHS, auth_middleware};
pub use security::security_headers;
