// ==========================================
// 家禽批次管理系统 - 批次统计 API
// ==========================================
// 职责: 读取批次与报告 → 统计引擎 → 回写派生字段 / 记录重算日志
// 红线: 重算为整体覆盖写, 可重复执行, 不做增量补丁
// 架构: API 层 → Engine 层 (compute_snapshot_with) → Repository 层
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::StatsConfigReader;
use crate::domain::batch::BatchDerivedFields;
use crate::domain::recalc_log::RecalcLog;
use crate::domain::report::{normalize_timestamp, Report};
use crate::domain::snapshot::StatisticsSnapshot;
use crate::domain::types::RecalcTrigger;
use crate::engine::derivation::HealthThresholds;
use crate::engine::snapshot::compute_snapshot_with;
use crate::repository::{BatchRepository, RecalcLogRepository, ReportRepository};

// ==========================================
// ReprocessSummary - 全量重算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessSummary {
    pub run_id: String,
    pub batches_total: usize,
    pub batches_processed: usize,
    pub reports_processed: usize,
    pub failures: Vec<ReprocessFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessFailure {
    pub batch_id: String,
    pub error: String,
}

// ==========================================
// BatchStatsApi - 批次统计 API
// ==========================================

/// 批次统计API
///
/// 职责：
/// 1. 单批次统计查询（只读）
/// 2. 单批次重算并回写
/// 3. 管理员全量重算
/// 4. 报告提交后自动重算
pub struct BatchStatsApi {
    batch_repo: Arc<BatchRepository>,
    report_repo: Arc<ReportRepository>,
    recalc_log_repo: Arc<RecalcLogRepository>,
    config: Arc<dyn StatsConfigReader>,
}

impl BatchStatsApi {
    /// 创建新的BatchStatsApi实例
    ///
    /// # 参数
    /// - batch_repo: 批次仓储
    /// - report_repo: 报告仓储
    /// - recalc_log_repo: 重算日志仓储
    /// - config: 健康阈值配置读取器
    pub fn new(
        batch_repo: Arc<BatchRepository>,
        report_repo: Arc<ReportRepository>,
        recalc_log_repo: Arc<RecalcLogRepository>,
        config: Arc<dyn StatsConfigReader>,
    ) -> Self {
        Self {
            batch_repo,
            report_repo,
            recalc_log_repo,
            config,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 计算批次统计快照（不落库）
    ///
    /// # 参数
    /// - batch_id: 批次ID
    /// - now: 计算时刻（用于在养天数）
    ///
    /// # 返回
    /// - Ok(StatisticsSnapshot): 统计快照
    /// - Err(ApiError::InvalidInput): 批次ID为空
    /// - Err(ApiError::NotFound): 批次不存在
    pub async fn get_statistics(&self, batch_id: &str, now: DateTime<Utc>) -> ApiResult<StatisticsSnapshot> {
        let thresholds = self.load_thresholds().await?;
        let (snapshot, _) = self.compute(batch_id, now, &thresholds)?;
        Ok(snapshot)
    }

    /// 查询批次重算历史（新 → 旧）
    pub fn list_recalc_history(&self, batch_id: &str, limit: i32) -> ApiResult<Vec<RecalcLog>> {
        validate_batch_id(batch_id)?;
        if limit <= 0 {
            return Err(ApiError::InvalidInput(format!("limit必须为正数: {}", limit)));
        }
        Ok(self.recalc_log_repo.find_by_batch(batch_id, limit)?)
    }

    // ==========================================
    // 重算接口
    // ==========================================

    /// 重算单个批次并回写（使用当前时刻）
    pub async fn recompute_batch(&self, batch_id: &str, trigger: RecalcTrigger) -> ApiResult<StatisticsSnapshot> {
        self.recompute_batch_at(batch_id, trigger, Utc::now()).await
    }

    /// 重算单个批次并回写
    ///
    /// # 说明
    /// 单事务内完成以下三步, 任一步失败整体回滚:
    /// - 覆盖写批次派生字段（last write wins）
    /// - 标注本次参与计算的报告为已处理
    /// - 追加一条重算日志
    pub async fn recompute_batch_at(
        &self,
        batch_id: &str,
        trigger: RecalcTrigger,
        now: DateTime<Utc>,
    ) -> ApiResult<StatisticsSnapshot> {
        let thresholds = self.load_thresholds().await?;
        self.recompute_and_persist(batch_id, trigger, None, now, &thresholds)
    }

    /// 全量重算所有批次（使用当前时刻）
    pub async fn reprocess_all(&self, trigger: RecalcTrigger) -> ApiResult<ReprocessSummary> {
        self.reprocess_all_at(trigger, Utc::now()).await
    }

    /// 全量重算所有批次
    ///
    /// 单个批次失败只记录告警, 不中断整体运行
    pub async fn reprocess_all_at(&self, trigger: RecalcTrigger, now: DateTime<Utc>) -> ApiResult<ReprocessSummary> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let thresholds = self.load_thresholds().await?;
        let batches = self.batch_repo.list_all()?;

        info!(run_id = %run_id, batches_total = batches.len(), trigger = %trigger, "开始全量重算");

        let mut summary = ReprocessSummary {
            run_id: run_id.clone(),
            batches_total: batches.len(),
            batches_processed: 0,
            reports_processed: 0,
            failures: Vec::new(),
        };

        for batch in &batches {
            match self.recompute_and_persist(&batch.batch_id, trigger, Some(run_id.clone()), now, &thresholds) {
                Ok(snapshot) => {
                    summary.batches_processed += 1;
                    summary.reports_processed += snapshot.reports_processed;
                }
                Err(e) => {
                    warn!(run_id = %run_id, batch_id = %batch.batch_id, error = %e, "批次重算失败，继续执行");
                    summary.failures.push(ReprocessFailure {
                        batch_id: batch.batch_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            run_id = %run_id,
            batches_processed = summary.batches_processed,
            failures = summary.failures.len(),
            reports_processed = summary.reports_processed,
            "全量重算完成"
        );

        Ok(summary)
    }

    // ==========================================
    // 报告提交
    // ==========================================

    /// 提交报告并重算所属批次（使用当前时刻）
    pub async fn submit_report(&self, report: Report) -> ApiResult<StatisticsSnapshot> {
        self.submit_report_at(report, Utc::now()).await
    }

    /// 提交报告并重算所属批次
    ///
    /// # 返回
    /// - Ok(StatisticsSnapshot): 包含新报告的统计快照
    /// - Err(ApiError::InvalidInput): 报告ID/批次ID/类型为空, 或创建时间无法解析
    ///
    /// 创建时间统一规范化为 UTC RFC 3339 后落库
    /// - Err(ApiError::NotFound): 批次不存在
    pub async fn submit_report_at(&self, mut report: Report, now: DateTime<Utc>) -> ApiResult<StatisticsSnapshot> {
        validate_batch_id(&report.batch_id)?;
        if report.id.trim().is_empty() {
            return Err(ApiError::InvalidInput("报告ID不能为空".to_string()));
        }
        if report.type_tag.trim().is_empty() {
            return Err(ApiError::InvalidInput("报告类型不能为空".to_string()));
        }
        let created_at = normalize_timestamp(&report.created_at).ok_or_else(|| {
            ApiError::InvalidInput(format!("报告时间无法解析: {}", report.created_at))
        })?;
        report.created_at = created_at;
        if self.batch_repo.find_by_id(&report.batch_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Batch(id={})不存在", report.batch_id)));
        }

        self.report_repo.insert(&report)?;
        debug!(batch_id = %report.batch_id, report_id = %report.id, type_tag = %report.type_tag, "报告已写入");

        self.recompute_batch_at(&report.batch_id, RecalcTrigger::ReportSubmitted, now)
            .await
    }

    // ==========================================
    // 内部方法
    // ==========================================

    async fn load_thresholds(&self) -> ApiResult<HealthThresholds> {
        self.config
            .get_health_thresholds()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 读取输入并计算快照, 同时返回参与计算的报告ID
    fn compute(
        &self,
        batch_id: &str,
        now: DateTime<Utc>,
        thresholds: &HealthThresholds,
    ) -> ApiResult<(StatisticsSnapshot, Vec<String>)> {
        validate_batch_id(batch_id)?;

        let profile = self.batch_repo.find_profile(batch_id)?;
        let reports = self.report_repo.find_by_batch(batch_id)?;
        let snapshot = compute_snapshot_with(&profile, &reports, now, thresholds);
        let report_ids = reports.into_iter().map(|r| r.id).collect();

        Ok((snapshot, report_ids))
    }

    fn recompute_and_persist(
        &self,
        batch_id: &str,
        trigger: RecalcTrigger,
        run_id: Option<String>,
        now: DateTime<Utc>,
        thresholds: &HealthThresholds,
    ) -> ApiResult<StatisticsSnapshot> {
        let (snapshot, report_ids) = self.compute(batch_id, now, thresholds)?;
        let recalc_ts = now.naive_utc();

        let derived = BatchDerivedFields::from(&snapshot);
        let log = RecalcLog::from_snapshot(&snapshot, trigger, run_id, recalc_ts);
        let marked = self
            .batch_repo
            .persist_recompute(batch_id, &derived, &report_ids, &log)?;

        info!(
            batch_id = %batch_id,
            reports_processed = snapshot.reports_processed,
            newly_marked = marked,
            total_mortality = snapshot.total_mortality,
            health_status = %snapshot.health_status,
            trigger = %trigger,
            "批次统计已重算并回写"
        );

        Ok(snapshot)
    }
}

fn validate_batch_id(batch_id: &str) -> ApiResult<()> {
    if batch_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
    }
    Ok(())
}
