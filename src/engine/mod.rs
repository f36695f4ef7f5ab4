// ==========================================
// 家禽批次管理系统 - 引擎层
// ==========================================
// 职责: 批次统计派生规则 (字段解析 → 分类 → 聚合 → 派生)
// 红线: Engine 不拼 SQL, 不读时钟, 不落库
// ==========================================

pub mod aggregator;
pub mod classifier;
pub mod derivation;
pub mod field_resolver;
pub mod snapshot;

// 重导出核心引擎
pub use aggregator::{AggregateTotals, Aggregator};
pub use classifier::{normalize_tag, ReportClassifier};
pub use derivation::{elapsed_days, round2, DerivationEngine, HealthThresholds};
pub use field_resolver::{aliases, FieldResolver, FromFieldValue, Quantity, ResolvedMetrics};
pub use snapshot::{compute_snapshot, compute_snapshot_with};
