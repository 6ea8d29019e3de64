//! 用户业务服务
//!
//! 每个操作都是一次完整的 读取 → 校验/修改 → 写回 循环，不跨请求缓存数据。

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::model::{non_empty, now, CreateUserRequest, UpdateUserRequest, User};
use crate::core::error::CoreError;
use crate::infrastructure::store::RecordStore;

pub const USER_NOT_FOUND: &str = "User not found";
pub const REQUIRED_FIELDS: &str = "First name, last name, and email are required";
pub const EMAIL_TAKEN: &str = "Email already registered";

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn RecordStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.store.load_all().await)
    }

    pub async fn count(&self) -> usize {
        self.store.load_all().await.len()
    }

    pub async fn get_user(&self, id: &str) -> Result<User, CoreError> {
        self.store
            .load_all()
            .await
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(not_found)
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User, CoreError> {
        let (first_name, last_name, email) = match (
            non_empty(req.first_name.as_deref()),
            non_empty(req.last_name.as_deref()),
            non_empty(req.email.as_deref()),
        ) {
            (Some(f), Some(l), Some(e)) => (f.to_string(), l.to_string(), e.to_string()),
            _ => {
                warn!("创建用户缺少必填字段");
                return Err(CoreError::BadRequest(REQUIRED_FIELDS.to_string()));
            }
        };

        let mut users = self.store.load_all().await;

        if users.iter().any(|u| u.email == email) {
            warn!("邮箱已被注册: {}", email);
            return Err(CoreError::BadRequest(EMAIL_TAKEN.to_string()));
        }

        let ts = now();
        let user = User {
            id: fresh_id(&users),
            first_name,
            last_name,
            email,
            phone: req.phone.unwrap_or_default(),
            address: req.address.unwrap_or_default(),
            date_of_birth: req.date_of_birth.unwrap_or_default(),
            created_at: ts,
            updated_at: ts,
        };

        users.push(user.clone());
        self.store.save_all(&users).await?;

        info!("用户已创建: {}", user.id);
        Ok(user)
    }

    /// 更新用户
    ///
    /// 未提交的字段保持不变。可选字段提交空串或 `null` 即清空；
    /// 必填字段提交空值时忽略，保证记录上的必填字段始终非空。
    pub async fn update_user(&self, id: &str, req: UpdateUserRequest) -> Result<User, CoreError> {
        let mut users = self.store.load_all().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(not_found)?;

        let email = non_empty(req.email.as_ref().and_then(|e| e.as_deref()));
        if let Some(email) = email {
            let taken = email != users[index].email
                && users.iter().any(|u| u.email == email && u.id != id);
            if taken {
                warn!("邮箱已被其他用户使用: {}", email);
                return Err(CoreError::BadRequest(EMAIL_TAKEN.to_string()));
            }
        }

        let user = &mut users[index];

        if let Some(v) = non_empty(req.first_name.as_ref().and_then(|v| v.as_deref())) {
            user.first_name = v.to_string();
        }
        if let Some(v) = non_empty(req.last_name.as_ref().and_then(|v| v.as_deref())) {
            user.last_name = v.to_string();
        }
        if let Some(v) = email {
            user.email = v.to_string();
        }
        if let Some(v) = req.phone {
            user.phone = v.unwrap_or_default();
        }
        if let Some(v) = req.address {
            user.address = v.unwrap_or_default();
        }
        if let Some(v) = req.date_of_birth {
            user.date_of_birth = v.unwrap_or_default();
        }
        user.updated_at = now().max(user.created_at);

        let updated = user.clone();
        self.store.save_all(&users).await?;

        info!("用户已更新: {}", id);
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User, CoreError> {
        let mut users = self.store.load_all().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(not_found)?;

        let deleted = users.remove(index);
        self.store.save_all(&users).await?;

        info!("用户已删除: {}", id);
        Ok(deleted)
    }
}

fn not_found() -> CoreError {
    CoreError::NotFound(USER_NOT_FOUND.to_string())
}

fn fresh_id(users: &[User]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if users.iter().all(|u| u.id != id) {
            return id;
        }
    }
}
