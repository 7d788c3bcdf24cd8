// ==========================================
// 加气混凝土质量分析 - API 层
// ==========================================
// 职责: 对外报表接口（参数校验 + 查询 + 计算）
// ==========================================

pub mod analysis_api;
pub mod autoclave_api;
pub mod error;

pub use analysis_api::AnalysisApi;
pub use autoclave_api::AutoclaveApi;
pub use error::{ApiError, ApiResult, NO_BATCHES_MESSAGE};
