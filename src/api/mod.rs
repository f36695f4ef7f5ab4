// ==========================================
// 家禽批次管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行入口与上层服务调用
// ==========================================

pub mod batch_stats_api;
pub mod dashboard_api;
pub mod error;

// 重导出核心类型
pub use batch_stats_api::{BatchStatsApi, ReprocessFailure, ReprocessSummary};
pub use dashboard_api::{DashboardApi, DashboardOverview, HealthDistribution};
pub use error::{ApiError, ApiResult};
