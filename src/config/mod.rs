// ==========================================
// 家禽批次管理系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod stats_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use stats_config_trait::{DefaultStatsConfig, StatsConfigReader};

use std::path::PathBuf;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "POULTRY_BATCH_STATS_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./poultry_batch_stats.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        let app_dir = if cfg!(debug_assertions) {
            data_dir.join("poultry-batch-stats-dev")
        } else {
            data_dir.join("poultry-batch-stats")
        };

        if std::fs::create_dir_all(&app_dir).is_ok() {
            path = app_dir.join("poultry_batch_stats.db");
        }
    }

    path.to_string_lossy().to_string()
}
