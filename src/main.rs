// ==========================================
// 加气混凝土质量分析 - 命令行入口
// ==========================================
// 用法:
//   aac-quality-analytics batch-quality --start-date 2024-01-01 --mould-id 7
//   aac-quality-analytics rejection-trends --group-by week
//   aac-quality-analytics mould-performance
//   aac-quality-analytics segregation --end-date 2024-03-31
//   aac-quality-analytics autoclave-records --start-date 2024-05-01
// 报表以 JSON 输出到 stdout, 日志输出到 stderr
// ==========================================

use aac_quality_analytics::app::{get_default_db_path, AppState, DB_PATH_ENV};
use aac_quality_analytics::logging;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// 加气混凝土批次质量分析
#[derive(Parser, Debug)]
#[command(name = "aac-quality-analytics")]
#[command(about = "Quality analytics over AAC production batch records")]
#[command(version)]
struct Cli {
    /// SQLite 数据库路径
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<String>,

    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    json_logs: bool,

    /// 紧凑输出（不缩进）
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct DateRange {
    /// 起始日期（含）, YYYY-MM-DD
    #[arg(long)]
    start_date: Option<String>,

    /// 结束日期（含）, YYYY-MM-DD
    #[arg(long)]
    end_date: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// 批次质量汇总
    BatchQuality {
        #[command(flatten)]
        range: DateRange,

        /// 模具编号
        #[arg(long)]
        mould_id: Option<String>,
    },

    /// 剔除趋势
    RejectionTrends {
        #[command(flatten)]
        range: DateRange,

        /// day / week / month
        #[arg(long)]
        group_by: Option<String>,
    },

    /// 模具表现
    MouldPerformance {
        #[command(flatten)]
        range: DateRange,
    },

    /// 分拣缺陷分析
    Segregation {
        #[command(flatten)]
        range: DateRange,

        /// 模具编号
        #[arg(long)]
        mould_id: Option<String>,
    },

    /// 蒸压釜记录
    AutoclaveRecords {
        #[command(flatten)]
        range: DateRange,
    },
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", text);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).context("无法初始化AppState")?;
    let api = state.analysis_api.clone();

    match cli.command {
        Command::BatchQuality { range, mould_id } => {
            let stats = api.get_batch_quality(
                range.start_date.as_deref(),
                range.end_date.as_deref(),
                mould_id.as_deref(),
            )?;
            print_json(&stats, cli.compact)
        }
        Command::RejectionTrends { range, group_by } => {
            let rows = api.get_rejection_trends(
                range.start_date.as_deref(),
                range.end_date.as_deref(),
                group_by.as_deref(),
            )?;
            print_json(&rows, cli.compact)
        }
        Command::MouldPerformance { range } => {
            let rows = api.get_mould_performance(
                range.start_date.as_deref(),
                range.end_date.as_deref(),
            )?;
            print_json(&rows, cli.compact)
        }
        Command::Segregation { range, mould_id } => {
            let report = api.get_segregation_analysis(
                range.start_date.as_deref(),
                range.end_date.as_deref(),
                mould_id.as_deref(),
            )?;
            print_json(&report, cli.compact)
        }
        Command::AutoclaveRecords { range } => {
            let records = state.autoclave_api.list_autoclave_records(
                range.start_date.as_deref(),
                range.end_date.as_deref(),
            )?;
            print_json(&records, cli.compact)
        }
    }
}
