// ==========================================
// 加气混凝土质量分析 - 应用层
// ==========================================
// 职责: 装配各层实例, 供 CLI 与导入工具使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
