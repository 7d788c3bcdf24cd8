// ==========================================
// 加气混凝土质量分析 - 配置管理器
// ==========================================
// 职责: 分析参数加载、查询、覆写
// 存储: config_kv 表 (scope_id + key → value)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::Granularity;
use crate::engine::segregation::{DEFAULT_TOP_MOULD_LIMIT, DEFAULT_WORST_BATCH_LIMIT};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// AnalysisConfig - 分析参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// 分拣分析: 平均缺陷最多的模具数
    pub top_mould_limit: usize,
    /// 分拣分析: 缺陷率最高的批次数
    pub worst_batch_limit: usize,
    /// 趋势分析: 未指定 group_by 时的粒度
    pub default_group_by: Granularity,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_mould_limit: DEFAULT_TOP_MOULD_LIMIT,
            worst_batch_limit: DEFAULT_WORST_BATCH_LIMIT,
            default_group_by: Granularity::Day,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 按路径打开并建表
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取配置值, 不存在时返回默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 所有 global 配置的快照（按键排序）
    pub fn get_config_snapshot(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    // ===== 分析参数 =====

    /// 加载分析参数; 存储值无效时回退默认值并告警
    pub fn load_analysis_config(&self) -> Result<AnalysisConfig, Box<dyn Error>> {
        let defaults = AnalysisConfig::default();

        Ok(AnalysisConfig {
            top_mould_limit: self.parse_or_default(
                config_keys::TOP_MOULD_LIMIT,
                defaults.top_mould_limit,
                |v| v.parse::<usize>().ok().filter(|n| *n > 0),
            )?,
            worst_batch_limit: self.parse_or_default(
                config_keys::WORST_BATCH_LIMIT,
                defaults.worst_batch_limit,
                |v| v.parse::<usize>().ok().filter(|n| *n > 0),
            )?,
            default_group_by: self.parse_or_default(
                config_keys::DEFAULT_GROUP_BY,
                defaults.default_group_by,
                |v| Granularity::from_str(v).ok(),
            )?,
        })
    }

    fn parse_or_default<T, F>(&self, key: &str, default: T, parse: F) -> Result<T, Box<dyn Error>>
    where
        T: std::fmt::Debug,
        F: Fn(&str) -> Option<T>,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match parse(raw.trim()) {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(key, value = %raw, fallback = ?default, "配置值无效, 使用默认值");
                Ok(default)
            }
        }
    }
}

/// 配置键常量
pub mod config_keys {
    pub const TOP_MOULD_LIMIT: &str = "analysis.top_mould_limit";
    pub const WORST_BATCH_LIMIT: &str = "analysis.worst_batch_limit";
    pub const DEFAULT_GROUP_BY: &str = "analysis.default_group_by";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = setup();
        assert_eq!(config.load_analysis_config().unwrap(), AnalysisConfig::default());
        assert_eq!(config.get_config_or_default("missing", "x").unwrap(), "x");
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let config = setup();
        config.set_config_value(config_keys::TOP_MOULD_LIMIT, "5").unwrap();
        config.set_config_value(config_keys::DEFAULT_GROUP_BY, "month").unwrap();

        let loaded = config.load_analysis_config().unwrap();
        assert_eq!(loaded.top_mould_limit, 5);
        assert_eq!(loaded.worst_batch_limit, DEFAULT_WORST_BATCH_LIMIT);
        assert_eq!(loaded.default_group_by, Granularity::Month);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = setup();
        config.set_config_value(config_keys::WORST_BATCH_LIMIT, "0").unwrap();
        config.set_config_value(config_keys::DEFAULT_GROUP_BY, "quarter").unwrap();

        let loaded = config.load_analysis_config().unwrap();
        assert_eq!(loaded.worst_batch_limit, DEFAULT_WORST_BATCH_LIMIT);
        assert_eq!(loaded.default_group_by, Granularity::Day);
    }

    #[test]
    fn test_upsert_and_snapshot() {
        let config = setup();
        config.set_config_value(config_keys::TOP_MOULD_LIMIT, "3").unwrap();
        config.set_config_value(config_keys::TOP_MOULD_LIMIT, "4").unwrap();

        let snapshot = config.get_config_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(config_keys::TOP_MOULD_LIMIT).map(String::as_str), Some("4"));
    }
}
