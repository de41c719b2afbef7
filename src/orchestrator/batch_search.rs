//! 批量搜索编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **批次循环**：最多 `MAX_BATCHES` 次顺序调用搜索服务
//! 2. **去重合并**：按名称（忽略大小写）去重，保持首次发现顺序
//! 3. **停止判断**：首批为空、服务耗尽、预热后无新增、达到上限、被取消
//! 4. **进度推送**：每批开始推送文案，每批合并后推送全部记录
//! 5. **历史记录**：会话结束且有结果时保存一次
//!
//! 单批失败只记录日志并跳过，不影响已经得到的结果。

use crate::config::{Config, MAX_BATCHES};
use crate::error::SearchError;
use crate::models::{name_key, CompanyRecord};
use crate::orchestrator::events::{
    status_label, ChannelObserver, SearchEvent, SearchObserver, SearchOutcome, StopReason,
};
use crate::services::{HistoryLog, SearchProvider};
use crate::utils::logging::{log_batch_merged, log_search_start, print_final_stats};
use futures::Stream;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 前几批即使没有新增也继续
const WARM_UP_BATCHES: usize = 3;

/// 编排参数
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub max_batches: usize,
    pub batch_delay: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_batches: MAX_BATCHES,
            batch_delay: Duration::from_millis(1500),
        }
    }
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_batches: config.max_batches,
            batch_delay: config.batch_delay(),
        }
    }
}

/// 单次会话的累积状态
struct SearchSession {
    records: Vec<CompanyRecord>,
    seen: HashSet<String>,
}

impl SearchSession {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// 已找到的名称，原样传给服务用于排除
    fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    /// 合并新一批记录，返回新增条数
    fn merge(&mut self, batch: Vec<CompanyRecord>) -> usize {
        let before = self.records.len();
        for record in batch {
            if self.seen.insert(name_key(&record.name)) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }
}

/// 批量搜索编排器
pub struct BatchSearch {
    provider: Arc<dyn SearchProvider>,
    history: Arc<HistoryLog>,
    settings: SearchSettings,
}

impl BatchSearch {
    pub fn new(provider: Arc<dyn SearchProvider>, history: Arc<HistoryLog>) -> Self {
        Self::with_settings(provider, history, SearchSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn SearchProvider>,
        history: Arc<HistoryLog>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            provider,
            history,
            settings,
        }
    }

    /// 执行一次完整的搜索会话
    ///
    /// 只有空查询会返回 `Err`；其余情况（包括无结果、取消）都通过
    /// `SearchOutcome` 报告，已经累积的记录不会丢失
    pub async fn run<O>(
        &self,
        query: &str,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<SearchOutcome, SearchError>
    where
        O: SearchObserver + ?Sized,
    {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let max_batches = self.settings.max_batches.clamp(1, MAX_BATCHES);
        log_search_start(query, max_batches);

        let mut session = SearchSession::new();
        let mut failed_batches = Vec::new();
        let mut batches_run = 0;
        let mut stop_reason = StopReason::BatchLimit;
        let mut session_error = None;

        for batch in 1..=max_batches {
            if cancel.is_cancelled() {
                info!("⏹️ 搜索已被取消，保留已找到的 {} 条记录", session.records.len());
                stop_reason = StopReason::Cancelled;
                break;
            }

            let label = status_label(batch);
            info!("[第 {}/{} 批] {}", batch, max_batches, label);
            observer.on_status(batch, &label);
            batches_run = batch;

            let exclude_names = session.names();
            let fetched = match self.provider.fetch_batch(query, &exclude_names).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("[第 {} 批] ⚠️ 请求失败，跳过本批继续: {}", batch, e);
                    failed_batches.push(batch);
                    continue;
                }
            };

            if fetched.is_empty() {
                if batch == 1 {
                    warn!("⚠️ 第一批没有返回任何公司");
                    stop_reason = StopReason::NoResults;
                    session_error = Some(SearchError::NoResults);
                } else {
                    info!("[第 {} 批] 服务没有更多结果", batch);
                    stop_reason = StopReason::Exhausted;
                }
                break;
            }

            let added = session.merge(fetched);
            log_batch_merged(batch, added, session.records.len());

            if added == 0 && batch > WARM_UP_BATCHES {
                info!("[第 {} 批] 没有新的公司，提前结束", batch);
                stop_reason = StopReason::NoNewResults;
                break;
            }

            observer.on_results(batch, &session.records);

            if batch < max_batches {
                self.pause(cancel).await;
            }
        }

        let records = session.records;
        let history_id = if records.is_empty() {
            None
        } else {
            match self.history.record(query, records.clone()).await {
                Ok(entry) => Some(entry.id),
                Err(e) => {
                    error!("❌ 保存搜索历史失败: {}", e);
                    session_error = Some(SearchError::Session(e.to_string()));
                    None
                }
            }
        };

        let outcome = SearchOutcome {
            query: query.to_string(),
            records,
            stop_reason,
            batches_run,
            failed_batches,
            history_id,
            error: session_error,
        };

        print_final_stats(&outcome);
        observer.on_finished(&outcome);

        Ok(outcome)
    }

    /// 以事件流的形式执行搜索
    ///
    /// 会话在后台任务中运行，流以 `SearchEvent::Finished` 结束。
    /// `cancel` 或丢弃返回的流都会让会话在当前批次后停止
    pub fn stream(
        self: Arc<Self>,
        query: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<impl Stream<Item = SearchEvent>, SearchError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let (tx, rx) = futures::channel::mpsc::unbounded();
        let cancel = cancel.child_token();
        tokio::spawn(async move {
            let mut observer = ChannelObserver::new(tx, cancel.clone());
            if let Err(e) = self.run(&query, &cancel, &mut observer).await {
                warn!("搜索未能启动: {}", e);
            }
        });

        Ok(rx)
    }

    /// 批次间等待，收到取消信号时提前返回
    async fn pause(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = sleep(self.settings.batch_delay) => {}
            _ = cancel.cancelled() => {
                debug!("等待期间收到取消信号");
            }
        }
    }
}
