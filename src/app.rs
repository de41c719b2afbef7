use crate::cli::{Command, HistoryAction};
use crate::config::Config;
use crate::models::{CompanyRecord, HistoryEntry};
use crate::orchestrator::{BatchSearch, SearchObserver, SearchOutcome, SearchSettings};
use crate::services::csv_export::{default_file_name, write_csv};
use crate::services::{AdminGate, CompanySearchService, FileBlobStore, HistoryLog};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    history: Arc<HistoryLog>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let store = Arc::new(FileBlobStore::new(&config.data_dir));
        let history = Arc::new(HistoryLog::with_limit(store, config.history_limit));

        info!("📁 数据目录: {}", config.data_dir.display());

        Ok(Self { config, history })
    }

    /// 执行命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Search {
                query,
                output,
                max_batches,
                no_export,
            } => {
                let query = Command::query_text(&query);
                let outcome = self.search(&query, max_batches).await?;
                if !no_export {
                    let path = output.unwrap_or_else(|| PathBuf::from(default_file_name()));
                    export(&path, &outcome.records).await?;
                }
                Ok(())
            }
            Command::History { key, action } => self.history(&key, action).await,
        }
    }

    /// 执行一次搜索会话，Ctrl-C 会在当前批次完成后停止
    async fn search(&self, query: &str, max_batches: Option<usize>) -> Result<SearchOutcome> {
        let mut config = self.config.clone();
        if let Some(max_batches) = max_batches {
            config.max_batches = max_batches;
        }
        config.validate()?;

        let provider = CompanySearchService::new(&config).context("无法创建 LLM 客户端")?;
        let search = BatchSearch::with_settings(
            Arc::new(provider),
            self.history.clone(),
            SearchSettings::from_config(&config),
        );

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("⏹️ 收到中断信号，本批完成后停止");
                    cancel.cancel();
                }
            }
        });

        let mut progress = ConsoleProgress::default();
        let result = search.run(query, &cancel, &mut progress).await;
        watcher.abort();

        let outcome = result?;
        if let Some(error) = &outcome.error {
            println!("⚠️ {}", error.user_message());
        }
        Ok(outcome)
    }

    /// 历史记录命令
    async fn history(&self, key: &str, action: HistoryAction) -> Result<()> {
        let gate = AdminGate::new(self.config.admin_access_key.clone(), self.history.clone());
        let session = gate
            .unlock(key)
            .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

        match action {
            HistoryAction::List => {
                let entries = session.entries().await?;
                if entries.is_empty() {
                    println!("暂无历史记录");
                }
                for entry in &entries {
                    print_entry_summary(entry);
                }
            }
            HistoryAction::Show { id } => {
                let entry = session
                    .find(&id)
                    .await?
                    .with_context(|| format!("找不到历史记录: {}", id))?;
                print_entry_summary(&entry);
                for (index, record) in entry.results.iter().enumerate() {
                    print_record(index + 1, record);
                }
            }
            HistoryAction::Export { id, output } => {
                let entry = session
                    .find(&id)
                    .await?
                    .with_context(|| format!("找不到历史记录: {}", id))?;
                let path = output
                    .unwrap_or_else(|| PathBuf::from(format!("beagle_history_{}.csv", entry.id)));
                export(&path, &entry.results).await?;
            }
            HistoryAction::Clear { yes } => {
                if !yes {
                    warn!("⚠️ 清空历史需要确认，请加上 --yes");
                    return Ok(());
                }
                session.clear().await?;
                println!("历史记录已清空");
            }
        }

        Ok(())
    }
}

async fn export(path: &std::path::Path, records: &[CompanyRecord]) -> Result<()> {
    match write_csv(path, records).await? {
        Some(path) => println!("📄 CSV 已保存: {}", path.display()),
        None => info!("没有可导出的记录"),
    }
    Ok(())
}

/// 终端进度输出：每批打印文案，只打印新增的记录
#[derive(Default)]
struct ConsoleProgress {
    printed: usize,
}

impl SearchObserver for ConsoleProgress {
    fn on_status(&mut self, batch: usize, label: &str) {
        println!("🐶 [{}] {}", batch, label);
    }

    fn on_results(&mut self, _batch: usize, records: &[CompanyRecord]) {
        for (offset, record) in records.iter().enumerate().skip(self.printed) {
            print_record(offset + 1, record);
        }
        self.printed = records.len();
        println!("   共 {} 家公司", records.len());
    }
}

fn print_record(no: usize, record: &CompanyRecord) {
    println!(
        "{:>4}. {} | {} | {} | {}, {} | {}",
        no,
        record.name,
        record.website,
        record.linkedin,
        record.country,
        record.state,
        record.industry
    );
}

fn print_entry_summary(entry: &HistoryEntry) {
    println!(
        "{}  {}  \"{}\"  ({} 家公司)",
        entry.id,
        entry.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
        entry.query,
        entry.results.len()
    );
}
