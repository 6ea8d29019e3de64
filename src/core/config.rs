//! 应用配置

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 端口环境变量
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// 服务配置，由 main 构造后显式传给路由层
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// 用户数据文件 (JSON 数组)
    pub data_file: PathBuf,
    /// 前端静态资源目录
    pub public_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            data_file: PathBuf::from("data").join("users.json"),
            public_dir: PathBuf::from("public"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// 从环境变量读取配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            config.port = raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    name: PORT_ENV,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(config)
    }

    pub fn index_file(&self) -> PathBuf {
        self.public_dir.join("index.html")
    }
}
