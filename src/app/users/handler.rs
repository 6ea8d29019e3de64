//! 用户处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use super::{
    model::{CreateUserRequest, UpdateUserRequest, User},
    service::UserService,
};
use crate::core::{error::CoreError, extract::Payload, response::ApiResponse};

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, CoreError>;

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let user = state.user_service.get_user(&id).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Payload(req): Payload<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), CoreError> {
    let user = state.user_service.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(req): Payload<UpdateUserRequest>,
) -> ApiResult<User> {
    let user = state.user_service.update_user(&id, req).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let user = state.user_service.delete_user(&id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 健康检查
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let users = state.user_service.count().await;
    Json(ApiResponse::success(json!({ "status": "ok", "users": users })))
}
