// ==========================================
// 加气混凝土质量分析 - 数据仓储层
// ==========================================
// 红线: Repository 不含统计逻辑
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod autoclave_repo;
pub mod batch_repo;
pub mod error;
pub mod sql_builder;

// 重导出核心仓储
pub use autoclave_repo::AutoclaveRecordRepository;
pub use batch_repo::{document_id, BatchQuery, BatchRecordRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use sql_builder::SqlQueryBuilder;
