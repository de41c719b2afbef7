//! 公司记录

use serde::{Deserialize, Serialize};

/// 未知字段的占位值
pub const NOT_AVAILABLE: &str = "N/A";

/// 一条公司记录
///
/// 去重只看 `name`（忽略大小写），其他字段不参与任何比较
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub website: String,
    pub linkedin: String,
    pub country: String,
    pub state: String,
    pub industry: String,
}

impl CompanyRecord {
    /// 只有名称的记录，其余字段为 "N/A"
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: NOT_AVAILABLE.to_string(),
            linkedin: NOT_AVAILABLE.to_string(),
            country: NOT_AVAILABLE.to_string(),
            state: NOT_AVAILABLE.to_string(),
            industry: NOT_AVAILABLE.to_string(),
        }
    }

    /// 名称为空或为占位值时视为无效记录
    pub fn has_name(&self) -> bool {
        let name = self.name.trim();
        !name.is_empty() && !name.eq_ignore_ascii_case(NOT_AVAILABLE)
    }

    /// 去掉首尾空白，空字段替换为 "N/A"
    pub fn normalized(self) -> Self {
        Self {
            name: normalize_field(self.name),
            website: normalize_field(self.website),
            linkedin: normalize_field(self.linkedin),
            country: normalize_field(self.country),
            state: normalize_field(self.state),
            industry: normalize_field(self.industry),
        }
    }

    /// 按导出顺序排列的字段
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.name,
            &self.website,
            &self.linkedin,
            &self.country,
            &self.state,
            &self.industry,
        ]
    }
}

/// 名称比较键：去空白并转小写
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_field(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}
