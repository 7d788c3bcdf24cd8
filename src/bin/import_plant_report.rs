// Import a plant daily report (.xlsx/.xls/.csv) into the batch store.
//
// Usage:
//   cargo run --bin import_plant_report -- <report_path> [--date YYYY-MM-DD] [--db path] [--created-by name]
//
// Without --date the current local date is written to every batch document.

use aac_quality_analytics::app::{get_default_db_path, AppState, DB_PATH_ENV};
use aac_quality_analytics::domain::batch::DATE_FORMAT;
use aac_quality_analytics::logging;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "import_plant_report")]
#[command(about = "Import a plant daily report into the batch store")]
struct Args {
    /// 日报文件路径
    report: PathBuf,

    /// 生产日期, YYYY-MM-DD（默认今天）
    #[arg(long)]
    date: Option<String>,

    /// SQLite 数据库路径
    #[arg(long, env = DB_PATH_ENV)]
    db: Option<String>,

    /// 写入文档 metadata.createdBy
    #[arg(long)]
    created_by: Option<String>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let process_date = match &args.date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", raw))?,
        None => Local::now().date_naive(),
    };

    let db_path = args.db.clone().unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).context("无法初始化AppState")?;

    let mut importer = state.importer();
    if let Some(created_by) = &args.created_by {
        importer = importer.with_created_by(created_by);
    }

    let summary = importer
        .import_file(&args.report, process_date)
        .with_context(|| format!("导入失败: {}", args.report.display()))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
