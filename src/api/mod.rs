//! 接口层
//!
//! 负责 HTTP 路由、请求校验、响应映射和接口文档

pub mod docs;
pub mod handlers;
pub mod router;
pub mod validator;

pub use router::{create_router, AppState};
pub use validator::validate_document_request;
