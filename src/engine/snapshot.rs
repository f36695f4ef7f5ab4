// ==========================================
// 家禽批次管理系统 - 快照计算入口
// ==========================================
// 流程: 批次 + 报告(时间正序) → 分类/解析 → 聚合 → 派生 → 快照
// 红线: 无状态纯函数, 可并发调用, 重复调用结果一致
// ==========================================

use crate::domain::batch::BatchProfile;
use crate::domain::report::Report;
use crate::domain::snapshot::StatisticsSnapshot;
use crate::engine::aggregator::Aggregator;
use crate::engine::derivation::{DerivationEngine, HealthThresholds};
use chrono::{DateTime, Utc};

/// 使用默认阈值计算快照
pub fn compute_snapshot(batch: &BatchProfile, reports: &[Report], now: DateTime<Utc>) -> StatisticsSnapshot {
    compute_snapshot_with(batch, reports, now, &HealthThresholds::default())
}

/// 使用指定阈值计算快照
pub fn compute_snapshot_with(
    batch: &BatchProfile,
    reports: &[Report],
    now: DateTime<Utc>,
    thresholds: &HealthThresholds,
) -> StatisticsSnapshot {
    let totals = Aggregator::aggregate(reports);
    DerivationEngine::derive(batch, totals, now, thresholds)
}
