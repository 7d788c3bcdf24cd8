// ==========================================
// 加气混凝土质量分析 - 配置层
// ==========================================
// 职责: 分析参数管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, AnalysisConfig, ConfigManager};
