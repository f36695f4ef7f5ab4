// ==========================================
// 家禽批次管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::stats_config_trait::StatsConfigReader;
use crate::engine::derivation::HealthThresholds;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
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

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取浮点配置，缺失或格式错误时使用默认值
    fn get_f64_or_default(&self, key: &str, default: f64) -> ConfigResult<f64> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, default, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// StatsConfigReader Trait 实现
// ==========================================
#[async_trait]
impl StatsConfigReader for ConfigManager {
    async fn get_health_thresholds(&self) -> ConfigResult<HealthThresholds> {
        let defaults = HealthThresholds::default();

        let thresholds = HealthThresholds {
            poor_above_pct: self.get_f64_or_default(config_keys::MORTALITY_POOR_THRESHOLD_PCT, defaults.poor_above_pct)?,
            fair_above_pct: self.get_f64_or_default(config_keys::MORTALITY_FAIR_THRESHOLD_PCT, defaults.fair_above_pct)?,
            good_above_pct: self.get_f64_or_default(config_keys::MORTALITY_GOOD_THRESHOLD_PCT, defaults.good_above_pct)?,
        };

        if !thresholds.is_valid() {
            tracing::warn!(?thresholds, "健康阈值非严格递减，回退默认值");
            return Ok(defaults);
        }

        Ok(thresholds)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 健康状态阈值（死亡率 %）
    pub const MORTALITY_POOR_THRESHOLD_PCT: &str = "mortality_poor_threshold_pct";
    pub const MORTALITY_FAIR_THRESHOLD_PCT: &str = "mortality_fair_threshold_pct";
    pub const MORTALITY_GOOD_THRESHOLD_PCT: &str = "mortality_good_threshold_pct";
}
