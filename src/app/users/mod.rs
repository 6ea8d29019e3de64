//! 用户管理：模型、业务服务、HTTP 处理器

pub mod handler;
pub mod model;
pub mod service;
