// ==========================================
// 家禽批次管理系统 - 派生引擎
// ==========================================
// 职责: 聚合结果 + 批次静态属性 → 统计快照
// 红线: 全函数, 数据缺失/零分母一律得 0, 不报错
// 红线: 当前时间由调用方传入, 引擎内不读时钟
// ==========================================

use crate::domain::batch::BatchProfile;
use crate::domain::snapshot::StatisticsSnapshot;
use crate::domain::types::HealthStatus;
use crate::engine::aggregator::AggregateTotals;
use crate::domain::report::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// HealthThresholds - 健康状态阈值（死亡率 %）
// ==========================================
// 严格大于比较, 自上而下首个命中生效
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub poor_above_pct: f64,
    pub fair_above_pct: f64,
    pub good_above_pct: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            poor_above_pct: 5.0,
            fair_above_pct: 3.0,
            good_above_pct: 1.0,
        }
    }
}

impl HealthThresholds {
    /// 按死亡率判定健康状态
    pub fn classify(&self, mortality_rate_pct: f64) -> HealthStatus {
        if mortality_rate_pct > self.poor_above_pct {
            HealthStatus::Poor
        } else if mortality_rate_pct > self.fair_above_pct {
            HealthStatus::Fair
        } else if mortality_rate_pct > self.good_above_pct {
            HealthStatus::Good
        } else {
            HealthStatus::Excellent
        }
    }

    /// 阈值须非负、有限且严格递减
    pub fn is_valid(&self) -> bool {
        [self.poor_above_pct, self.fair_above_pct, self.good_above_pct]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && self.poor_above_pct > self.fair_above_pct
            && self.fair_above_pct > self.good_above_pct
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 零分母保护的除法
fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// 饲养天数 = max(0, floor(now - start))，日期无法解析时为 0
pub fn elapsed_days(start_date: &str, now: DateTime<Utc>) -> u64 {
    match parse_timestamp(start_date) {
        Some(start) => u64::try_from((now - start).num_days()).unwrap_or(0),
        None => {
            tracing::debug!(start_date = %start_date, "开始日期无法解析，饲养天数按 0 计");
            0
        }
    }
}

// ==========================================
// DerivationEngine
// ==========================================
pub struct DerivationEngine;

impl DerivationEngine {
    /// 派生统计快照（主入口）
    ///
    /// # 参数
    /// - profile: 批次静态属性 + 上次已知值
    /// - totals: 聚合结果（历史列表移入快照）
    /// - now: 当前时间（仅用于饲养天数）
    /// - thresholds: 健康状态阈值
    pub fn derive(
        profile: &BatchProfile,
        totals: AggregateTotals,
        now: DateTime<Utc>,
        thresholds: &HealthThresholds,
    ) -> StatisticsSnapshot {
        let original = profile.original_bird_count;

        // === 步骤 1: 存栏与死亡率 ===
        let remaining_birds = original.saturating_sub(totals.total_mortality);
        let mortality_rate_pct = if original > 0 {
            round2(totals.total_mortality as f64 / original as f64 * 100.0)
        } else {
            0.0
        };

        // === 步骤 2: 健康状态 ===
        let health_status = thresholds.classify(mortality_rate_pct);

        // === 步骤 3: 体重（最近值 → 平均值 → 上次已知 → 0）===
        let current_weight = totals
            .latest_weight
            .or_else(|| totals.average_weight())
            .or(profile.last_known_current_weight)
            .unwrap_or(0.0);
        let live_weight = current_weight * remaining_birds as f64;

        // === 步骤 4: 料肉比 ===
        let feed_conversion_ratio = round2(safe_div(totals.total_feed_used, live_weight));

        // === 步骤 5: 天数折算 ===
        let elapsed = elapsed_days(&profile.start_date, now);
        let day_divisor = elapsed.max(1) as f64;
        let daily_mortality_rate = round2(mortality_rate_pct / day_divisor);
        let average_daily_feed = round2(totals.total_feed_used / day_divisor);

        // === 步骤 6: 环境均值（无读数时沿用上次已知值）===
        let average_temperature = round2(
            totals
                .average_temperature()
                .or(profile.last_known_temperature)
                .unwrap_or(0.0),
        );
        let average_humidity = round2(
            totals
                .average_humidity()
                .or(profile.last_known_humidity)
                .unwrap_or(0.0),
        );

        StatisticsSnapshot {
            batch_id: profile.id.clone(),
            total_original_birds: original,
            remaining_birds,
            total_mortality: totals.total_mortality,
            mortality_rate_pct,
            daily_mortality_rate,
            health_status,
            health_score: health_status.health_score(),
            average_temperature,
            average_humidity,
            total_vaccinations: totals.total_vaccinations,
            total_feed_used: totals.total_feed_used,
            average_daily_feed,
            feed_conversion_ratio,
            current_weight,
            total_live_weight: round2(live_weight),
            elapsed_days: elapsed,
            mortality_history: totals.mortality_history,
            feed_history: totals.feed_history,
            health_history: totals.health_history,
            vaccination_history: totals.vaccination_history,
            weight_history: totals.weight_history,
            reports_processed: totals.reports_processed,
        }
    }
}
