// ==========================================
// 加气混凝土质量分析 - 应用状态
// ==========================================
// 职责: 打开数据库、建表、装配仓储/配置/API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AnalysisApi, ApiError, ApiResult, AutoclaveApi};
use crate::config::{AnalysisConfig, ConfigManager};
use crate::importer::PlantReportImporter;
use crate::repository::{AutoclaveRecordRepository, BatchRecordRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "AAC_ANALYTICS_DB_PATH";

/// 应用状态
///
/// CLI 与导入工具共用同一套装配
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生效的分析参数
    pub analysis_config: AnalysisConfig,

    /// 批次文档仓储
    pub batch_repo: Arc<BatchRecordRepository>,

    /// 蒸压釜记录仓储
    pub autoclave_repo: Arc<AutoclaveRecordRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 质量分析API
    pub analysis_api: Arc<AnalysisApi>,

    /// 蒸压釜记录API
    pub autoclave_api: Arc<AutoclaveApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库并应用统一 PRAGMA
    /// 2. 建表（幂等）
    /// 3. 加载分析参数并创建 API 实例
    pub fn new(db_path: String) -> ApiResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| ApiError::DatabaseError(format!("无法打开数据库: {}", e)))?;
        crate::db::init_schema(&conn)
            .map_err(|e| ApiError::DatabaseError(format!("建表失败: {}", e)))?;
        let conn = Arc::new(Mutex::new(conn));

        let batch_repo = Arc::new(BatchRecordRepository::new(conn.clone()));
        let autoclave_repo = Arc::new(AutoclaveRecordRepository::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| ApiError::ConfigError(e.to_string()))?,
        );

        let analysis_config = config_manager
            .load_analysis_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        tracing::debug!(?analysis_config, "分析参数已加载");

        let analysis_api = Arc::new(AnalysisApi::with_config(batch_repo.clone(), analysis_config));
        let autoclave_api = Arc::new(AutoclaveApi::new(autoclave_repo.clone()));

        Ok(Self {
            db_path,
            analysis_config,
            batch_repo,
            autoclave_repo,
            config_manager,
            analysis_api,
            autoclave_api,
        })
    }

    /// 共享同一仓储的日报导入器
    pub fn importer(&self) -> PlantReportImporter {
        PlantReportImporter::new(self.batch_repo.clone())
            .with_autoclave_repo(self.autoclave_repo.clone())
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./aac_quality.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("aac-quality-analytics");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("aac_quality.db");
        }
    }

    path.to_string_lossy().to_string()
}
