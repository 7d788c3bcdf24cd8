// ==========================================
// 加气混凝土质量分析 - 引擎层错误与结果类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
///
/// 字段解析失败不在此列: 记录模型将其视为缺失值就地恢复
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// 日期格式错误、未知 group_by 等调用方参数错误
    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

/// 引擎层 Result 别名
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// 分析结果: 有数据的报表, 或明确的"无数据"
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome<T> {
    Report(T),
    /// 输入批次序列为空
    NoData,
}

impl<T> AnalysisOutcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, AnalysisOutcome::NoData)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            AnalysisOutcome::Report(report) => Some(report),
            AnalysisOutcome::NoData => None,
        }
    }
}
