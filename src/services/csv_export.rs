//! CSV 导出
//!
//! 表头固定，序号从 1 开始，所有文本字段都加双引号（内部引号写成两个）

use crate::models::CompanyRecord;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// 导出表头
pub const CSV_HEADER: &str = "NO,Company Name,Website,Linkedin URL,Country,State,Industry";

/// 生成 CSV 文本（行之间用 `\n` 分隔，末尾没有换行）
pub fn generate_csv(records: &[CompanyRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for (index, record) in records.iter().enumerate() {
        let fields: Vec<String> = record.fields().iter().map(|f| quote(f)).collect();
        lines.push(format!("{},{}", index + 1, fields.join(",")));
    }

    lines.join("\n")
}

/// 默认导出文件名
pub fn default_file_name() -> String {
    format!(
        "beagle_complete_scan_{}.csv",
        chrono::Utc::now().timestamp_millis()
    )
}

/// 把记录写入 CSV 文件
///
/// 没有记录时不写文件，返回 `None`
pub async fn write_csv(path: &Path, records: &[CompanyRecord]) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        return Ok(None);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }

    tokio::fs::write(path, generate_csv(records))
        .await
        .with_context(|| format!("无法写入 CSV 文件: {}", path.display()))?;

    info!("📄 已导出 {} 条记录到 {}", records.len(), path.display());
    Ok(Some(path.to_path_buf()))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            website: "https://example.com".to_string(),
            linkedin: "https://linkedin.com/company/example".to_string(),
            country: "USA".to_string(),
            state: "N/A".to_string(),
            industry: "Software, SaaS".to_string(),
        }
    }

    #[test]
    fn test_header_only_for_empty_input() {
        assert_eq!(generate_csv(&[]), CSV_HEADER);
    }

    #[test]
    fn test_rows_are_numbered_and_quoted() {
        let csv = generate_csv(&[record("Acme"), record("Globex")]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            r#"1,"Acme","https://example.com","https://linkedin.com/company/example","USA","N/A","Software, SaaS""#
        );
        assert!(lines[2].starts_with("2,\"Globex\","));
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let csv = generate_csv(&[record(r#"Acme "Best" Co"#)]);
        assert!(csv.contains(r#""Acme ""Best"" Co""#));
    }

    #[test]
    fn test_reparse_recovers_original_values() {
        let records = vec![
            record(r#"Acme "Best" Co"#),
            CompanyRecord {
                industry: "Line one\nline two".to_string(),
                ..record("Comma, Inc.")
            },
        ];
        let csv = generate_csv(&records);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][1], r#"Acme "Best" Co"#);
        assert_eq!(&rows[1][1], "Comma, Inc.");
        assert_eq!(&rows[1][6], "Line one\nline two");
    }

    #[tokio::test]
    async fn test_write_csv_skips_empty() {
        let path = std::env::temp_dir().join(format!("beagle-empty-{}.csv", uuid::Uuid::new_v4()));
        assert!(write_csv(&path, &[]).await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_csv_writes_file() {
        let dir = std::env::temp_dir().join(format!("beagle-csv-{}", uuid::Uuid::new_v4()));
        let path = dir.join("out.csv");

        let written = write_csv(&path, &[record("Acme")]).await.unwrap();
        assert_eq!(written.as_deref(), Some(path.as_path()));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(CSV_HEADER));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_default_file_name() {
        let name = default_file_name();
        assert!(name.starts_with("beagle_complete_scan_"));
        assert!(name.ends_with(".csv"));
    }
}
