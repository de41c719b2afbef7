//! 历史记录访问控制
//!
//! 查看、导出、清空历史之前必须先用访问密钥解锁

use crate::error::SearchError;
use crate::models::HistoryEntry;
use crate::services::history_store::HistoryLog;
use anyhow::Result;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// 访问控制
pub struct AdminGate {
    access_key: Option<String>,
    history: Arc<HistoryLog>,
}

/// 解锁后的历史记录视图
pub struct AdminSession {
    history: Arc<HistoryLog>,
}

impl AdminGate {
    pub fn new(access_key: Option<String>, history: Arc<HistoryLog>) -> Self {
        Self {
            access_key: access_key.filter(|key| !key.is_empty()),
            history,
        }
    }

    /// 用访问密钥解锁
    pub fn unlock(&self, key: &str) -> Result<AdminSession, SearchError> {
        let Some(expected) = self.access_key.as_deref() else {
            warn!("⚠️ 未配置访问密钥，拒绝访问历史记录");
            return Err(SearchError::AccessKeyNotConfigured);
        };

        if !bool::from(key.as_bytes().ct_eq(expected.as_bytes())) {
            warn!("⚠️ 访问密钥错误");
            return Err(SearchError::InvalidAccessKey);
        }

        info!("🔓 已解锁历史记录");
        Ok(AdminSession {
            history: self.history.clone(),
        })
    }
}

impl AdminSession {
    pub async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.history.entries().await?)
    }

    pub async fn find(&self, id: &str) -> Result<Option<HistoryEntry>> {
        Ok(self.history.find(id).await?)
    }

    pub async fn clear(&self) -> Result<()> {
        Ok(self.history.clear().await?)
    }
}
