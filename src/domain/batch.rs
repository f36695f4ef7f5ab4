// ==========================================
// 家禽批次管理系统 - 批次领域模型
// ==========================================
// 职责: 批次实体、统计引擎输入视图、回写字段
// 红线: original_bird_count 建档后不可变; 存栏数只派生, 不落库
// ==========================================

use crate::domain::snapshot::StatisticsSnapshot;
use crate::domain::types::{BatchStatus, HealthStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Batch - 批次
// ==========================================
// 对齐: batches 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    // ===== 主数据 =====
    pub batch_id: String,
    pub batch_name: String,
    pub farmer_id: Option<String>,
    pub original_bird_count: i64, // 建档时写入, 之后不变
    pub start_date: String,       // ISO-8601
    pub status: BatchStatus,

    // ===== 最近一次派生结果 (由重算覆盖) =====
    pub current_mortality: i64,
    pub health_status: Option<HealthStatus>,
    pub feed_used: f64,
    pub current_weight: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub vaccination_count: i64,

    // ===== 元数据 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Batch {
    /// 新建批次（派生字段为空）
    pub fn new(
        batch_id: impl Into<String>,
        batch_name: impl Into<String>,
        original_bird_count: i64,
        start_date: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            batch_name: batch_name.into(),
            farmer_id: None,
            original_bird_count,
            start_date: start_date.into(),
            status: BatchStatus::Planning,
            current_mortality: 0,
            health_status: None,
            feed_used: 0.0,
            current_weight: None,
            temperature: None,
            humidity: None,
            vaccination_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// BatchProfile - 统计引擎输入
// ==========================================
// 只包含引擎需要的静态属性与上次已知值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProfile {
    pub id: String,
    pub original_bird_count: u64,
    pub start_date: String,
    #[serde(default)]
    pub last_known_current_weight: Option<f64>,
    #[serde(default)]
    pub last_known_temperature: Option<f64>,
    #[serde(default)]
    pub last_known_humidity: Option<f64>,
}

impl BatchProfile {
    pub fn new(id: impl Into<String>, original_bird_count: u64, start_date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            original_bird_count,
            start_date: start_date.into(),
            last_known_current_weight: None,
            last_known_temperature: None,
            last_known_humidity: None,
        }
    }
}

// ==========================================
// BatchDerivedFields - 回写到批次行的派生字段
// ==========================================
// 整体覆盖写（last write wins）, 不做增量补丁
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDerivedFields {
    pub current_mortality: i64,
    pub health_status: HealthStatus,
    pub feed_used: f64,
    pub current_weight: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub vaccination_count: i64,
}

impl From<&StatisticsSnapshot> for BatchDerivedFields {
    fn from(s: &StatisticsSnapshot) -> Self {
        Self {
            current_mortality: i64::try_from(s.total_mortality).unwrap_or(i64::MAX),
            health_status: s.health_status,
            feed_used: s.total_feed_used,
            current_weight: s.current_weight,
            temperature: s.average_temperature,
            humidity: s.average_humidity,
            vaccination_count: i64::try_from(s.total_vaccinations).unwrap_or(i64::MAX),
        }
    }
}
