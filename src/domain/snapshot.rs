// ==========================================
// 家禽批次管理系统 - 统计快照领域模型
// ==========================================
// 职责: 派生引擎输出 (纯数据, 无行为)
// 红线: 快照永远可重算, 不是事实来源
// ==========================================

use crate::domain::types::HealthStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// 历史记录条目
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortalityEvent {
    pub timestamp: String,
    pub count: u64,
    pub cause: Option<String>,
    pub report_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    pub timestamp: String,
    pub amount: f64,
    pub feed_type: Option<String>,
    pub report_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReading {
    pub timestamp: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub status_note: Option<String>, // 上报的健康状态原文
    pub report_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationEvent {
    pub timestamp: String,
    pub count: u64,
    pub vaccine_name: Option<String>,
    pub report_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightReading {
    pub timestamp: String,
    pub weight: f64,
    pub report_id: String,
}

// ==========================================
// StatisticsSnapshot - 批次统计快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub batch_id: String,

    // ===== 存栏与死亡 =====
    pub total_original_birds: u64,
    pub remaining_birds: u64,
    pub total_mortality: u64,
    pub mortality_rate_pct: f64,
    pub daily_mortality_rate: f64,

    // ===== 健康 =====
    pub health_status: HealthStatus,
    pub health_score: u32,
    pub average_temperature: f64,
    pub average_humidity: f64,
    pub total_vaccinations: u64,

    // ===== 饲料与体重 =====
    pub total_feed_used: f64,
    pub average_daily_feed: f64,
    pub feed_conversion_ratio: f64,
    pub current_weight: f64,
    pub total_live_weight: f64,

    // ===== 时间 =====
    pub elapsed_days: u64,

    // ===== 历史 =====
    pub mortality_history: Vec<MortalityEvent>,
    pub feed_history: Vec<FeedEvent>,
    pub health_history: Vec<HealthReading>,
    pub vaccination_history: Vec<VaccinationEvent>,
    pub weight_history: Vec<WeightReading>,

    // ===== 元信息 =====
    pub reports_processed: usize,
}
