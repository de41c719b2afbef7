//! 历史记录存储 - 业务能力层
//!
//! `BlobStore` 是一个只有 load / save / remove 的键值存储，
//! `HistoryLog` 在其上维护"最近 N 次搜索"列表（最新的在最前）。

use crate::error::{StoreError, StoreResult};
use crate::models::{CompanyRecord, HistoryEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::fs;
use tracing::{debug, info, warn};

/// 历史记录使用的存储键
pub const HISTORY_KEY: &str = "beagle_search_history";

/// 默认保留条数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// 键值存储
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn load(&self, key: &str) -> StoreResult<Option<String>>;
    async fn save(&self, key: &str, blob: &str) -> StoreResult<()>;
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// 基于目录的存储，每个键对应一个 `<key>.json` 文件
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path.display().to_string(), e)),
        }
    }

    async fn save(&self, key: &str, blob: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(self.root.display().to_string(), e))?;

        // 先写临时文件再改名
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)
            .await
            .map_err(|e| StoreError::io(tmp.display().to_string(), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(path.display().to_string(), e))?;

        debug!("已写入 {}", path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path.display().to_string(), e)),
        }
    }
}

/// 内存存储
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned())
    }

    async fn save(&self, key: &str, blob: &str) -> StoreResult<()> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        Ok(())
    }
}

/// 搜索历史
///
/// 职责：
/// - 读取 / 追加 / 清空历史列表
/// - 追加时只保留最近 `limit` 条
/// - 条目创建后不再修改
pub struct HistoryLog {
    store: Arc<dyn BlobStore>,
    limit: usize,
    write_lock: tokio::sync::Mutex<()>,
}

impl HistoryLog {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn BlobStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// 全部历史，最新的在最前
    ///
    /// 存储内容损坏时记录警告并按空列表处理
    pub async fn entries(&self) -> StoreResult<Vec<HistoryEntry>> {
        let Some(blob) = self.store.load(HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&blob) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("⚠️ 历史记录无法解析，已忽略: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// 按 id 查找
    pub async fn find(&self, id: &str) -> StoreResult<Option<HistoryEntry>> {
        Ok(self.entries().await?.into_iter().find(|entry| entry.id == id))
    }

    /// 把一次会话的结果存为新条目，返回该条目
    pub async fn record(
        &self,
        query: &str,
        results: Vec<CompanyRecord>,
    ) -> StoreResult<HistoryEntry> {
        let entry = HistoryEntry::new(query, results);
        self.append(entry.clone()).await?;
        Ok(entry)
    }

    /// 追加条目，超出上限时淘汰最旧的
    pub async fn append(&self, entry: HistoryEntry) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.entries().await?;
        entries.insert(0, entry);
        if entries.len() > self.limit {
            let evicted = entries.len() - self.limit;
            entries.truncate(self.limit);
            debug!("淘汰 {} 条最旧的历史记录", evicted);
        }

        let blob = serde_json::to_string(&entries)?;
        self.store.save(HISTORY_KEY, &blob).await?;

        info!("💾 已保存搜索历史，共 {} 条", entries.len());
        Ok(())
    }

    /// 清空全部历史
    pub async fn clear(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(HISTORY_KEY).await?;
        info!("🗑️ 搜索历史已清空");
        Ok(())
    }
}
