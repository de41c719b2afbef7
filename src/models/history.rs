//! 搜索历史记录

use crate::models::company::CompanyRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次搜索会话的存档，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub results: Vec<CompanyRecord>,
}

impl HistoryEntry {
    /// 以当前时间创建新的存档
    pub fn new(query: impl Into<String>, results: Vec<CompanyRecord>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            query: query.into(),
            results,
        }
    }
}
