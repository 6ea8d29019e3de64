//! 核心中间件模块

use std::any::Any;
use std::time::Instant;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use tracing::{error, info, warn};

use super::{error::CoreError, response::ApiResponse};

pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// 请求日志中间件
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    info!(
        "{} {} - {} - {}ms - User-Agent: {:?}",
        method,
        uri,
        status,
        duration.as_millis(),
        user_agent
    );

    response
}

/// 处理器 panic 时返回 500 信封，消息取自 panic 载荷
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };

    error!("处理器 panic: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::failure(message)),
    )
        .into_response()
}

/// `HandleErrorLayer` 的错误处理：超时及其他中间件错误转为 500 信封
pub async fn handle_middleware_error(err: BoxError) -> CoreError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("请求处理超时");
        CoreError::Internal(TIMEOUT_MESSAGE.to_string())
    } else {
        CoreError::Internal(err.to_string())
    }
}
