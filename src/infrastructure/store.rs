//! 记录存储基础设施
//!
//! 整个用户集合保存在一个格式化的 JSON 数组文件中，每次请求整体读取、整体覆盖。

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::users::model::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize users: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 整集合读写接口
///
/// 读取失败时返回空集合而不是错误；写入错误交给调用方处理。
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_all(&self) -> Vec<User>;
    async fn save_all(&self, users: &[User]) -> Result<(), StoreError>;
}

/// 基于单个 JSON 文件的存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// 打开存储；文件不存在时先创建目录，再写入空数组
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        let store = Self { path };
        if !exists {
            store.save_all(&[]).await?;
            debug!("已创建空数据文件: {}", store.path.display());
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 每次写入使用独立的临时文件，并发写入互不干扰
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_all(&self) -> Vec<User> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("读取数据文件失败 {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        let records: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("解析数据文件失败 {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        // 逐条解码，单条记录损坏不影响其余记录
        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("跳过第 {} 条无法解析的记录: {}", index, e);
                    None
                }
            })
            .collect()
    }

    async fn save_all(&self, users: &[User]) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(users)?;
        let tmp = self.temp_path();

        fs::write(&tmp, body)
            .await
            .map_err(|e| self.io_error(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_error(&self.path, e));
        }

        debug!("已写入 {} 个用户到 {}", users.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::users::model::now;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample(id: &str, email: &str) -> User {
        let ts = now();
        User {
            id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            phone: String::new(),
            address: String::new(),
            date_of_birth: String::new(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[tokio::test]
    async fn open_creates_missing_directory_and_empty_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("users.json");

        let store = JsonFileStore::open(&path).await.unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn open_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.save_all(&[sample("1", "a@b.com")]).await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.load_all().await.len(), 1);
    }

    #[tokio::test]
    async fn save_then_load_preserves_records() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("users.json"))
            .await
            .unwrap();
        let users = vec![sample("1", "a@b.com"), sample("2", "c@d.com")];

        store.save_all(&users).await.unwrap();

        assert_eq!(store.load_all().await, users);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n != "users.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_all_succeed_and_leave_valid_file() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            JsonFileStore::open(dir.path().join("users.json"))
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let users = vec![sample(&i.to_string(), &format!("u{}@x.com", i))];
                    store.save_all(&users).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let users = store.load_all().await;
        assert_eq!(users.len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn null_and_numeric_optional_fields_load_as_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        std::fs::write(
            &path,
            r#"[
                {"id":"1","firstName":"A","lastName":"B","email":"a@b.com",
                 "phone":null,"address":"x","dateOfBirth":"",
                 "createdAt":"2024-05-01T10:00:00.123Z","updatedAt":"2024-05-01T10:00:00.123Z"},
                {"id":"2","firstName":"C","lastName":"D","email":"c@d.com",
                 "phone":5550100,"address":true,
                 "createdAt":"2024-05-01T10:00:00.123Z","updatedAt":"2024-05-01T10:00:00.123Z"}
            ]"#,
        )
        .unwrap();

        let users = store.load_all().await;

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].phone, "");
        assert_eq!(users[1].phone, "5550100");
        assert_eq!(users[1].address, "true");
        assert_eq!(users[1].date_of_birth, "");
    }

    #[tokio::test]
    async fn one_broken_record_does_not_hide_the_others() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        std::fs::write(
            &path,
            r#"[
                {"id":"1","firstName":"A","lastName":"B","email":"a@b.com",
                 "createdAt":"2024-05-01T10:00:00.123Z","updatedAt":"2024-05-01T10:00:00.123Z"},
                {"firstName":"broken"}
            ]"#,
        )
        .unwrap();

        let users = store.load_all().await;

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "1");
    }

    #[tokio::test]
    async fn saved_file_is_pretty_printed_camel_case() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("users.json"))
            .await
            .unwrap();
        store.save_all(&[sample("1", "a@b.com")]).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  {\n    \"id\": \"1\""));
        assert!(raw.contains("\"firstName\": \"Ada\""));
        assert!(raw.contains("\"dateOfBirth\": \"\""));
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn loads_records_written_with_millisecond_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        std::fs::write(
            &path,
            r#"[{"id":"abc","firstName":"A","lastName":"B","email":"a@b.com",
                "phone":"","address":"","dateOfBirth":"1990-01-01",
                "createdAt":"2024-05-01T10:00:00.123Z","updatedAt":"2024-05-01T10:00:00.123Z"}]"#,
        )
        .unwrap();

        let users = store.load_all().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].date_of_birth, "1990-01-01");
        assert_eq!(users[0].created_at, users[0].updated_at);
    }
}
