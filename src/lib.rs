//! # Beagle Search
//!
//! 反复询问 AI 服务来汇总公司列表的搜索客户端
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 一次 HTTP 调用，只负责请求和状态码
//! - `LlmClient` - OpenAI 兼容接口，带 JSON Schema 的结构化输出
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单批请求或单个存储操作
//! - `CompanySearchService` - 一批公司搜索（提示词 + 重试 + 解析）
//! - `HistoryLog` - 最多 50 条的搜索历史
//! - `csv_export` - CSV 生成与导出
//! - `AdminGate` - 历史记录的访问控制
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_search` - 批次循环、去重合并、停止条件
//! - `orchestrator/events` - 进度事件与观察者
//!
//! ### ④ 应用层（App）
//! - `app` / `cli` - 命令行入口
//!
//! ## 模块结构

pub mod app;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{ConfigError, ProviderError, SearchError, StoreError};
pub use models::{CompanyRecord, HistoryEntry};
pub use orchestrator::{BatchSearch, SearchEvent, SearchObserver, SearchOutcome, StopReason};
pub use services::{CompanySearchService, HistoryLog, SearchProvider};
