//! 认证模块
//!
//! JWT Token 的签发与校验

mod jwt;

pub use jwt::{Claims, IssuedToken, JwtManager};
