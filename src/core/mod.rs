//! 核心层：错误、响应信封、中间件、配置

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
