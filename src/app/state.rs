// ==========================================
// 家禽批次管理系统 - 应用状态
// ==========================================
// 职责: 打开数据库、初始化 schema、装配 Repository 与 API
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{BatchStatsApi, DashboardApi};
use crate::config::{ConfigManager, StatsConfigReader};
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::repository::{BatchRepository, RecalcLogRepository, ReportRepository};

/// 应用状态（所有 Repository 共享同一连接）
pub struct AppState {
    pub config_manager: Arc<ConfigManager>,
    pub batch_repo: Arc<BatchRepository>,
    pub report_repo: Arc<ReportRepository>,

    /// 批次统计API
    pub batch_stats_api: Arc<BatchStatsApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 打开数据库文件并装配
    ///
    /// # 返回
    /// - Ok(AppState): 初始化成功
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接装配（测试使用内存库）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            init_schema(&guard).map_err(|e| format!("schema 初始化失败: {}", e))?;
            let schema_version =
                read_schema_version(&guard).map_err(|e| format!("schema 版本读取失败: {}", e))?;
            tracing::info!(?schema_version, "数据库 schema 就绪");
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let batch_repo = Arc::new(BatchRepository::from_connection(conn.clone()));
        let report_repo = Arc::new(ReportRepository::from_connection(conn.clone()));
        let recalc_log_repo = Arc::new(RecalcLogRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let config_reader: Arc<dyn StatsConfigReader> = config_manager.clone();
        let batch_stats_api = Arc::new(BatchStatsApi::new(
            batch_repo.clone(),
            report_repo.clone(),
            recalc_log_repo,
            config_reader,
        ));
        let dashboard_api = Arc::new(DashboardApi::new(batch_repo.clone(), batch_stats_api.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            config_manager,
            batch_repo,
            report_repo,
            batch_stats_api,
            dashboard_api,
        })
    }
}
