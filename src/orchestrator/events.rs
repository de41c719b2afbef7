//! 搜索进度事件与结果

use crate::error::SearchError;
use crate::models::CompanyRecord;
use futures::channel::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 每一批开始时展示的进度文案，超出部分使用 `Scouring Batch {i}...`
pub const STATUS_PHRASES: [&str; 10] = [
    "Waking up the Pro Beagle...",
    "Analyzing market trends deeply...",
    "Extracting unique entities...",
    "Verifying website links...",
    "Scouring page 5 for rare matches...",
    "Still digging, quality takes time...",
    "Almost done, polishing results...",
    "Gathering the final batch...",
    "Final cross-check for duplicates...",
    "Done! Bringing back your records...",
];

/// 第 `batch` 批（从 1 开始）的进度文案
pub fn status_label(batch: usize) -> String {
    batch
        .checked_sub(1)
        .and_then(|idx| STATUS_PHRASES.get(idx))
        .map(|phrase| phrase.to_string())
        .unwrap_or_else(|| format!("Scouring Batch {}...", batch))
}

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 第一批就没有结果
    NoResults,
    /// 服务返回空批次
    Exhausted,
    /// 预热期之后某批没有新增
    NoNewResults,
    /// 达到批次上限
    BatchLimit,
    /// 被外部取消
    Cancelled,
}

/// 一次搜索会话的最终结果
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    /// 按首次发现顺序排列、名称不重复的记录
    pub records: Vec<CompanyRecord>,
    pub stop_reason: StopReason,
    /// 实际发起的批次数
    pub batches_run: usize,
    /// 失败并被跳过的批次编号
    pub failed_batches: Vec<usize>,
    /// 保存的历史记录 id
    pub history_id: Option<String>,
    /// 需要展示给用户的错误（无结果 / 意外错误）
    pub error: Option<SearchError>,
}

impl SearchOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.stop_reason == StopReason::Cancelled
    }
}

/// 推送给调用方的事件
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// 某一批开始
    Status { batch: usize, label: String },
    /// 某一批合并完成后的全部记录
    Results {
        batch: usize,
        records: Vec<CompanyRecord>,
    },
    /// 会话结束
    Finished(SearchOutcome),
}

/// 进度观察者
///
/// 所有方法都有空实现，按需覆盖
pub trait SearchObserver: Send {
    fn on_status(&mut self, _batch: usize, _label: &str) {}

    fn on_results(&mut self, _batch: usize, _records: &[CompanyRecord]) {}

    fn on_finished(&mut self, _outcome: &SearchOutcome) {}
}

/// 把事件收集到列表中
#[derive(Default)]
pub struct EventLog {
    pub events: Vec<SearchEvent>,
}

impl SearchObserver for EventLog {
    fn on_status(&mut self, batch: usize, label: &str) {
        self.events.push(SearchEvent::Status {
            batch,
            label: label.to_string(),
        });
    }

    fn on_results(&mut self, batch: usize, records: &[CompanyRecord]) {
        self.events.push(SearchEvent::Results {
            batch,
            records: records.to_vec(),
        });
    }

    fn on_finished(&mut self, outcome: &SearchOutcome) {
        self.events.push(SearchEvent::Finished(outcome.clone()));
    }
}

/// 把事件发送到通道
///
/// 接收端被丢弃后会取消会话，不再继续请求
pub struct ChannelObserver {
    tx: UnboundedSender<SearchEvent>,
    cancel: CancellationToken,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<SearchEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    fn send(&mut self, event: SearchEvent) {
        if self.tx.unbounded_send(event).is_err() && !self.cancel.is_cancelled() {
            debug!("事件接收端已关闭，取消搜索");
            self.cancel.cancel();
        }
    }
}

impl SearchObserver for ChannelObserver {
    fn on_status(&mut self, batch: usize, label: &str) {
        self.send(SearchEvent::Status {
            batch,
            label: label.to_string(),
        });
    }

    fn on_results(&mut self, batch: usize, records: &[CompanyRecord]) {
        self.send(SearchEvent::Results {
            batch,
            records: records.to_vec(),
        });
    }

    fn on_finished(&mut self, outcome: &SearchOutcome) {
        self.send(SearchEvent::Finished(outcome.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(1), "Waking up the Pro Beagle...");
        assert_eq!(status_label(10), "Done! Bringing back your records...");
        assert_eq!(status_label(11), "Scouring Batch 11...");
        assert_eq!(status_label(0), "Scouring Batch 0...");
    }

    #[test]
    fn test_channel_observer_cancels_when_receiver_dropped() {
        let (tx, rx) = futures::channel::mpsc::unbounded();
        let cancel = CancellationToken::new();
        let mut observer = ChannelObserver::new(tx, cancel.clone());

        observer.on_status(1, "first");
        assert!(!cancel.is_cancelled());

        drop(rx);
        observer.on_status(2, "second");
        assert!(cancel.is_cancelled());
    }
}
