//! # 用户注册管理服务
//!
//! 单资源 CRUD Web 应用的后端：
//! - 用户记录整体保存在一个 JSON 文件中，每个请求整体读取、整体写回
//! - `/api/users` 下提供 REST 风格的 JSON 接口，统一使用 `{success, data, error}` 信封
//! - 同时托管 `public/` 下的浏览器前端

pub mod app;
pub mod core;
pub mod infrastructure;
pub mod server;

pub use app::users::model::User;
pub use crate::core::config::AppConfig;
pub use server::{build_router, run};
