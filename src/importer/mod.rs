// ==========================================
// 加气混凝土质量分析 - 导入层
// ==========================================
// 职责: 工厂日报 (Excel/CSV) → 批次文档 → 仓储
// ==========================================

pub mod batch_importer;
pub mod document_builder;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use batch_importer::{ImportSummary, PlantReportImporter};
pub use document_builder::{DocumentBuilder, StepRows};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, PlantReport, RawRow};
