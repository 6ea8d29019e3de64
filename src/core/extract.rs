//! 请求体提取器
//!
//! 同时接受 JSON 和 `application/x-www-form-urlencoded` 请求体，
//! 解析失败统一转换为 400 信封。未声明 Content-Type 时按 JSON 解析，
//! 空请求体视为空对象。

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;

use super::error::CoreError;

pub struct Payload<T>(pub T);

enum BodyKind {
    Form,
    Json,
    Undeclared,
}

fn body_kind(req: &Request) -> BodyKind {
    match req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        None => BodyKind::Undeclared,
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => BodyKind::Form,
        Some(_) => BodyKind::Json,
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&req) {
            BodyKind::Form => {
                let Form(value) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(|e| CoreError::BadRequest(e.body_text()))?;
                Ok(Payload(value))
            }
            BodyKind::Json => {
                let Json(value) = Json::<T>::from_request(req, state)
                    .await
                    .map_err(|e| CoreError::BadRequest(e.body_text()))?;
                Ok(Payload(value))
            }
            BodyKind::Undeclared => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| CoreError::BadRequest(e.body_text()))?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Payload(T::default()));
                }
                let Json(value) = Json::<T>::from_bytes(&bytes)
                    .map_err(|e| CoreError::BadRequest(e.body_text()))?;
                Ok(Payload(value))
            }
        }
    }
}
