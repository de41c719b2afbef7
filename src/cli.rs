//! 命令行参数

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Beagle Search：反复询问 AI 服务，汇总去重后的公司列表并导出 CSV
#[derive(Debug, Parser)]
#[command(name = "beagle-search", version, about)]
pub struct Cli {
    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 搜索匹配查询的公司
    Search {
        /// 查询内容（多个词会用空格连接）
        #[arg(required = true)]
        query: Vec<String>,
        /// CSV 输出路径，默认 beagle_complete_scan_<时间戳>.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 本次最多批次数（1-10）
        #[arg(long)]
        max_batches: Option<usize>,
        /// 不导出 CSV
        #[arg(long)]
        no_export: bool,
    },
    /// 查看或管理搜索历史（需要访问密钥）
    History {
        /// 访问密钥
        #[arg(long)]
        key: String,
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    /// 列出全部历史
    List,
    /// 显示某条历史的全部记录
    Show { id: String },
    /// 把某条历史导出为 CSV
    Export {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 清空全部历史
    Clear {
        /// 确认清空
        #[arg(long)]
        yes: bool,
    },
}

impl Command {
    /// 拼接后的查询内容
    pub fn query_text(parts: &[String]) -> String {
        parts.join(" ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from([
            "beagle-search",
            "search",
            "solar",
            "installers",
            "--max-batches",
            "3",
            "-o",
            "out.csv",
        ]);

        match cli.command {
            Command::Search {
                query,
                output,
                max_batches,
                no_export,
            } => {
                assert_eq!(Command::query_text(&query), "solar installers");
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert_eq!(max_batches, Some(3));
                assert!(!no_export);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_history_clear() {
        let cli = Cli::parse_from(["beagle-search", "history", "--key", "k", "clear", "--yes"]);
        match cli.command {
            Command::History { key, action } => {
                assert_eq!(key, "k");
                assert!(matches!(action, HistoryAction::Clear { yes: true }));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["beagle-search", "search"]).is_err());
    }
}
