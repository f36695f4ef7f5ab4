// ==========================================
// 家禽批次管理系统 - 管理驾驶舱 API
// ==========================================
// 职责: 汇总全部批次的统计快照, 供管理员驾驶舱展示
// 架构: DashboardApi → BatchStatsApi (只读查询) → Engine
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::batch_stats_api::BatchStatsApi;
use crate::api::error::ApiResult;
use crate::domain::snapshot::StatisticsSnapshot;
use crate::domain::types::{BatchStatus, HealthStatus};
use crate::engine::derivation::round2;
use crate::repository::BatchRepository;

// ==========================================
// DashboardOverview - 驾驶舱总览
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    // ===== 批次数量 =====
    pub total_batches: usize,
    pub active_batches: usize,

    // ===== 存栏与死亡 =====
    pub total_original_birds: u64,
    pub total_remaining_birds: u64,
    pub total_mortality: u64,
    pub overall_mortality_rate_pct: f64,

    // ===== 饲料与健康 =====
    pub total_feed_used: f64,
    pub average_health_score: f64,
    pub health_distribution: HealthDistribution,

    // ===== 明细 =====
    pub batches: Vec<StatisticsSnapshot>,
    pub skipped_batches: Vec<String>, // 输入异常而未纳入汇总的批次
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

impl HealthDistribution {
    fn add(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Excellent => self.excellent += 1,
            HealthStatus::Good => self.good += 1,
            HealthStatus::Fair => self.fair += 1,
            HealthStatus::Poor => self.poor += 1,
        }
    }
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    batch_repo: Arc<BatchRepository>,
    stats_api: Arc<BatchStatsApi>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    ///
    /// # 参数
    /// - batch_repo: 批次仓储（批次列表与状态）
    /// - stats_api: 批次统计 API（逐批次计算快照）
    pub fn new(batch_repo: Arc<BatchRepository>, stats_api: Arc<BatchStatsApi>) -> Self {
        Self { batch_repo, stats_api }
    }

    /// 驾驶舱总览（只读, 不回写批次）
    ///
    /// 单个批次计算失败时记录告警并跳过, 不影响其余批次汇总
    pub async fn get_overview(&self, now: DateTime<Utc>) -> ApiResult<DashboardOverview> {
        let batches = self.batch_repo.list_all()?;

        let active_batches = batches
            .iter()
            .filter(|b| b.status == BatchStatus::Active)
            .count();

        let mut snapshots = Vec::with_capacity(batches.len());
        let mut skipped_batches = Vec::new();
        for batch in &batches {
            match self.stats_api.get_statistics(&batch.batch_id, now).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(batch_id = %batch.batch_id, error = %e, "驾驶舱汇总跳过批次");
                    skipped_batches.push(batch.batch_id.clone());
                }
            }
        }

        let total_original_birds = saturating_total(snapshots.iter().map(|s| s.total_original_birds));
        let total_remaining_birds = saturating_total(snapshots.iter().map(|s| s.remaining_birds));
        let total_mortality = saturating_total(snapshots.iter().map(|s| s.total_mortality));
        let total_feed_used: f64 = snapshots.iter().map(|s| s.total_feed_used).sum();

        let overall_mortality_rate_pct = if total_original_birds > 0 {
            round2(total_mortality as f64 / total_original_birds as f64 * 100.0)
        } else {
            0.0
        };

        let average_health_score = if snapshots.is_empty() {
            0.0
        } else {
            let score_sum: f64 = snapshots.iter().map(|s| f64::from(s.health_score)).sum();
            round2(score_sum / snapshots.len() as f64)
        };

        let mut health_distribution = HealthDistribution::default();
        for snapshot in &snapshots {
            health_distribution.add(snapshot.health_status);
        }

        Ok(DashboardOverview {
            total_batches: batches.len(),
            active_batches,
            total_original_birds,
            total_remaining_birds,
            total_mortality,
            overall_mortality_rate_pct,
            total_feed_used: round2(total_feed_used),
            average_health_score,
            health_distribution,
            batches: snapshots,
            skipped_batches,
        })
    }
}

/// 计数累加（溢出时饱和, 不回绕）
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0u64, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_total() {
        assert_eq!(saturating_total([3u64, 4, 5].into_iter()), 12);
        assert_eq!(saturating_total([u64::MAX - 1, 5, 7].into_iter()), u64::MAX);
        assert_eq!(saturating_total(std::iter::empty()), 0);
    }
}
