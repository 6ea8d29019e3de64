//! 基础设施层：日志、数据存储

pub mod logger;
pub mod store;
