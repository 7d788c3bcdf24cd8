// ==========================================
// 加气混凝土质量分析 - 时间分段引擎
// ==========================================
// 职责: 将批次日期映射为 日 / 周 / 月 分段键
// 周: 所在 ISO 周的周一; 月: 当月 1 日; 日: 原日期
// ==========================================

use crate::domain::batch::DATE_FORMAT;
use crate::domain::types::Granularity;
use crate::engine::error::{AnalysisError, AnalysisResult};
use chrono::{Datelike, Duration, NaiveDate};

/// 计算分段键（纯函数, 对任意合法日期全定义）
pub fn bucket(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            let offset = date.weekday().num_days_from_monday() as i64;
            date - Duration::days(offset)
        }
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// 解析 group_by 参数; 未提供时按日
pub fn parse_granularity(group_by: Option<&str>) -> AnalysisResult<Granularity> {
    match group_by {
        None => Ok(Granularity::Day),
        Some(raw) => raw
            .trim()
            .parse::<Granularity>()
            .map_err(AnalysisError::InvalidArgument),
    }
}

/// 解析查询参数中的日期 (YYYY-MM-DD)
pub fn parse_query_date(param: &str, value: &str) -> AnalysisResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AnalysisError::InvalidArgument(format!("Invalid {} format. Use YYYY-MM-DD", param))
    })
}
