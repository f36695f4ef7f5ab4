// ==========================================
// 家禽批次管理系统 - 批次统计核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 由报告流派生批次健康快照（纯函数引擎 + 回写）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 字段解析 / 分类 / 聚合 / 派生
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchStatus, HealthStatus, MetricCategory, RecalcTrigger, ReportKind};

// 领域实体
pub use domain::{Batch, BatchProfile, FieldBag, FieldValue, Report, StatisticsSnapshot};

// 引擎
pub use engine::{compute_snapshot, compute_snapshot_with, HealthThresholds};

// API
pub use api::{BatchStatsApi, DashboardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "家禽批次统计";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
