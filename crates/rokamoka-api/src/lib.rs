//! RokaMoka REST API
//!
//! 认证、展览目录、收藏册、权限申请与研究统计的 HTTP 接口。
//! 业务逻辑在 `mokadex` crate 中，这里只负责协议转换、鉴权和响应信封。

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
