//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次循环和进度推送，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_search` - 批量搜索编排器
//! - 顺序发起最多 10 批请求
//! - 去重合并，决定何时停止
//! - 会话结束后写入历史记录
//!
//! ### `events` - 进度事件
//! - 进度文案、观察者接口、事件流条目、最终结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_search (处理一次会话)
//!     ↓
//! services::company_search (处理一批请求)
//!     ↓
//! clients::llm_client (一次 HTTP 调用)
//! ```

pub mod batch_search;
pub mod events;

// 重新导出主要类型
pub use batch_search::{BatchSearch, SearchSettings};
pub use events::{
    status_label, ChannelObserver, EventLog, SearchEvent, SearchObserver, SearchOutcome, StopReason,
};
