// ==========================================
// 家禽批次管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod recalc_log;
pub mod report;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use batch::{Batch, BatchDerivedFields, BatchProfile};
pub use recalc_log::RecalcLog;
pub use report::{parse_timestamp, FieldBag, FieldValue, Report};
pub use snapshot::{
    FeedEvent, HealthReading, MortalityEvent, StatisticsSnapshot, VaccinationEvent, WeightReading,
};
pub use types::{BatchStatus, HealthStatus, MetricCategory, RecalcTrigger, ReportKind};
