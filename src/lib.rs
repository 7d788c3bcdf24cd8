// ==========================================
// 加气混凝土质量分析 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 批次质量统计（剔除 / 趋势 / 模具 / 分拣缺陷）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 批次视图与报表结构
pub mod domain;

// 数据仓储层 - 批次文档存取
pub mod repository;

// 引擎层 - 纯计算统计
pub mod engine;

// 导入层 - 工厂日报
pub mod importer;

// 配置层 - 分析参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 报表接口
pub mod api;

// 应用层 - 实例装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DefectType, Granularity, Position, RejectionField};

// 领域实体与报表
pub use domain::{
    BatchQualityStats, BatchRecord, MouldPerformanceRow, RejectionTrendRow, SegregationReport,
};

// 引擎
pub use engine::{
    AnalysisError, AnalysisOutcome, RejectionClassifier, ReportAssembler, SegregationAnalyzer,
};

// API
pub use api::{AnalysisApi, ApiError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "加气混凝土质量分析";
