/// 日志工具模块
///
/// 初始化 tracing，并提供日志格式化和输出的辅助函数
use crate::orchestrator::events::{SearchOutcome, StopReason};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用不会报错
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("beagle_search={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录搜索开始
///
/// # 参数
/// - `query`: 查询内容
/// - `max_batches`: 最大批次数
pub fn log_search_start(query: &str, max_batches: usize) {
    info!("{}", "=".repeat(60));
    info!("🐶 开始搜索: {}", truncate_text(query, 80));
    info!("📊 最多 {} 批", max_batches);
    info!("{}", "=".repeat(60));
}

/// 记录一批合并完成
///
/// # 参数
/// - `batch`: 批次编号
/// - `added`: 本批新增条数
/// - `total`: 累计条数
pub fn log_batch_merged(batch: usize, added: usize, total: usize) {
    info!("[第 {} 批] ✓ 新增 {} 条，累计 {} 条", batch, added, total);
}

/// 打印最终统计信息
pub fn print_final_stats(outcome: &SearchOutcome) {
    let reason = match outcome.stop_reason {
        StopReason::NoResults => "第一批无结果",
        StopReason::Exhausted => "服务没有更多结果",
        StopReason::NoNewResults => "没有新的结果",
        StopReason::BatchLimit => "达到批次上限",
        StopReason::Cancelled => "已取消",
    };

    info!("\n{}", "=".repeat(60));
    info!("📊 搜索完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 公司数量: {}", outcome.records.len());
    info!("📦 批次: {} (失败 {})", outcome.batches_run, outcome.failed_batches.len());
    info!("⏹️ 结束原因: {}", reason);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("公司名称很长", 2), "公司...");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
