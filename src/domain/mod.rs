// ==========================================
// 加气混凝土质量分析 - 领域模型层
// ==========================================
// 职责: 批次文档的类型化视图、计数器、报表结构
// 红线: 不含数据访问逻辑, 不含统计逻辑
// ==========================================

pub mod batch;
pub mod counters;
pub mod report;
pub mod types;

// 重导出核心类型
pub use batch::{BatchRecord, DefectCount, FieldValue, SegregationBlock};
pub use counters::{DefectCounters, RejectionCounters};
pub use report::{
    BatchQualityStats, DefectTypeCount, DefectTypeShare, MouldDefectProfile,
    MouldPerformanceRow, PositionBreakdown, RejectionSummary, RejectionTrendRow,
    SegregationEntry, SegregationReport, SegregationSummary,
};
pub use types::{DefectType, Granularity, Position, RejectionField};
