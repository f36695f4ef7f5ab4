// ==========================================
// 家禽批次管理系统 - 重算日志领域模型
// ==========================================
// 用途: 审计每一次统计重算（谁触发、处理了多少报告、结果摘要）
// 对齐: stats_recalc_log 表
// ==========================================

use crate::domain::snapshot::StatisticsSnapshot;
use crate::domain::types::{HealthStatus, RecalcTrigger};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalcLog {
    pub log_id: String,             // uuid v4
    pub batch_id: String,
    pub run_id: Option<String>,     // 全量重算时的运行ID
    pub trigger: RecalcTrigger,
    pub reports_processed: i64,
    pub total_mortality: i64,
    pub health_status: HealthStatus,
    pub recalc_ts: NaiveDateTime,
}

impl RecalcLog {
    /// 由快照生成日志条目
    pub fn from_snapshot(
        snapshot: &StatisticsSnapshot,
        trigger: RecalcTrigger,
        run_id: Option<String>,
        recalc_ts: NaiveDateTime,
    ) -> Self {
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            batch_id: snapshot.batch_id.clone(),
            run_id,
            trigger,
            reports_processed: snapshot.reports_processed as i64,
            total_mortality: i64::try_from(snapshot.total_mortality).unwrap_or(i64::MAX),
            health_status: snapshot.health_status,
            recalc_ts,
        }
    }
}
