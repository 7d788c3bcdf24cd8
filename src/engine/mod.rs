// ==========================================
// 加气混凝土质量分析 - 引擎层
// ==========================================
// 职责: 对已取回的批次序列做纯计算统计
// 红线: Engine 不拼 SQL, 不做 I/O; 空输入返回 NoData
// ==========================================

pub mod aggregator;
pub mod error;
pub mod period;
pub mod ranker;
pub mod rejection;
pub mod report_assembler;
pub mod segregation;

// 重导出核心引擎
pub use aggregator::{group_by, round2, safe_rate, safe_ratio, Grouped, RejectionTally};
pub use error::{AnalysisError, AnalysisOutcome, AnalysisResult};
pub use period::{bucket, parse_granularity, parse_query_date};
pub use ranker::{sort_descending, top_n};
pub use rejection::{format_rejection_label, RejectionClassifier};
pub use report_assembler::ReportAssembler;
pub use segregation::{SegregationAccumulator, SegregationAnalyzer};
