// ==========================================
// BatchStatsApi 集成测试
// ==========================================
// 测试范围:
// 1. 报告提交 → 自动重算 → 回写批次派生字段
// 2. 只读查询不落库
// 3. 重算幂等、全量重算的失败隔离
// 4. 输入校验与配置阈值覆写
// ==========================================


use poultry_batch_stats::api::ApiError;
use poultry_batch_stats::config::config_keys;
use poultry_batch_stats::domain::{BatchStatus, FieldValue, HealthStatus, RecalcTrigger};
use test_helpers::*;

fn mortality(id: &str, batch_id: &str, at: &str, deaths: i64) -> poultry_batch_stats::Report {
    report(
        id,
        batch_id,
        "Mortality",
        at,
        fields(&[("deathCount", FieldValue::from(deaths))]),
    )
}

// ==========================================
// 报告提交与回写
// ==========================================

#[tokio::test]
async fn test_submit_report_回写批次派生字段() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    let api = &state.batch_stats_api;

    api.submit_report_at(mortality("R1", "B001", "2025-06-02T08:00:00Z", 5), fixed_now())
        .await
        .unwrap();
    let snapshot = api
        .submit_report_at(mortality("R2", "B001", "2025-06-03T08:00:00Z", 3), fixed_now())
        .await
        .unwrap();

    assert_eq!(snapshot.total_mortality, 8);
    assert_eq!(snapshot.remaining_birds, 492);
    assert_eq!(snapshot.mortality_rate_pct, 1.6);
    assert_eq!(snapshot.health_status, HealthStatus::Good);
    assert_eq!(snapshot.elapsed_days, 10);
    assert_eq!(snapshot.daily_mortality_rate, 0.16);
    assert_eq!(snapshot.reports_processed, 2);

    let batch = state.batch_repo.find_by_id("B001").unwrap().unwrap();
    assert_eq!(batch.current_mortality, 8);
    assert_eq!(batch.health_status, Some(HealthStatus::Good));
    assert_eq!(batch.original_bird_count, 500);
    assert_eq!(batch.updated_at, fixed_now().naive_utc());

    let reports = state.report_repo.find_by_batch("B001").unwrap();
    assert!(reports.iter().all(|r| r.processed));

    let history = api.list_recalc_history("B001", 10).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|l| l.trigger == RecalcTrigger::ReportSubmitted));
    assert_eq!(history[0].total_mortality, 8);
}

#[tokio::test]
async fn test_daily_report_feed_and_weight() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    let api = &state.batch_stats_api;

    api.submit_report_at(mortality("R1", "B001", "2025-06-02T08:00:00Z", 5), fixed_now())
        .await
        .unwrap();
    api.submit_report_at(mortality("R2", "B001", "2025-06-03T08:00:00Z", 3), fixed_now())
        .await
        .unwrap();
    let daily = report(
        "R3",
        "B001",
        "Daily",
        "2025-06-04T08:00:00Z",
        fields(&[
            ("feedUsed", FieldValue::from(40)),
            ("averageWeight", FieldValue::from(1.2)),
        ]),
    );
    let snapshot = api.submit_report_at(daily, fixed_now()).await.unwrap();

    assert_eq!(snapshot.total_mortality, 8);
    assert_eq!(snapshot.total_feed_used, 40.0);
    assert_eq!(snapshot.current_weight, 1.2);
    assert_eq!(snapshot.total_live_weight, 590.4);
    assert_eq!(snapshot.feed_conversion_ratio, 0.07);
    assert_eq!(snapshot.average_daily_feed, 4.0);

    let batch = state.batch_repo.find_by_id("B001").unwrap().unwrap();
    assert_eq!(batch.feed_used, 40.0);
    assert_eq!(batch.current_weight, Some(1.2));
}

#[tokio::test]
async fn test_get_statistics_不写库() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    state
        .report_repo
        .insert(&mortality("R1", "B001", "2025-06-02T08:00:00Z", 30))
        .unwrap();

    let snapshot = state
        .batch_stats_api
        .get_statistics("B001", fixed_now())
        .await
        .unwrap();
    assert_eq!(snapshot.mortality_rate_pct, 6.0);
    assert_eq!(snapshot.health_status, HealthStatus::Poor);

    let batch = state.batch_repo.find_by_id("B001").unwrap().unwrap();
    assert_eq!(batch.current_mortality, 0);
    assert_eq!(batch.health_status, None);
    assert!(state.batch_stats_api.list_recalc_history("B001", 10).unwrap().is_empty());
    assert!(!state.report_repo.find_by_batch("B001").unwrap()[0].processed);
}

#[tokio::test]
async fn test_submit_report_混合时区按时刻排序() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 100, BatchStatus::Active);
    let api = &state.batch_stats_api;

    let weigh = |id: &str, at: &str, w: f64| {
        report(id, "B001", "Weight", at, fields(&[("averageWeight", FieldValue::from(w))]))
    };

    // a = 22:00Z, b = 01:00+05:00 = 20:00Z; 最新观测为 a
    api.submit_report_at(weigh("a", "2025-06-02T22:00:00Z", 2.0), fixed_now())
        .await
        .unwrap();
    let snapshot = api
        .submit_report_at(weigh("b", "2025-06-03T01:00:00+05:00", 1.0), fixed_now())
        .await
        .unwrap();

    assert_eq!(snapshot.current_weight, 2.0);
    assert_eq!(snapshot.weight_history[0].report_id, "b");
    assert_eq!(snapshot.weight_history[0].timestamp, "2025-06-02T20:00:00Z");

    let stored = state.report_repo.find_by_batch("B001").unwrap();
    assert_eq!(stored[0].id, "b");
    assert_eq!(stored[0].created_at, "2025-06-02T20:00:00Z");
    assert_eq!(stored[1].created_at, "2025-06-02T22:00:00Z");
}

#[tokio::test]
async fn test_submit_report_时间无法解析() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 100, BatchStatus::Active);

    let err = state
        .batch_stats_api
        .submit_report_at(mortality("R1", "B001", "last tuesday", 1), fixed_now())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(state.report_repo.find_by_batch("B001").unwrap().is_empty());
}

// ==========================================
// 重算
// ==========================================

#[tokio::test]
async fn test_recompute_幂等() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    state
        .report_repo
        .insert(&mortality("R1", "B001", "2025-06-02T08:00:00Z", 4))
        .unwrap();
    let api = &state.batch_stats_api;

    let first = api
        .recompute_batch_at("B001", RecalcTrigger::ManualRecompute, fixed_now())
        .await
        .unwrap();
    let row_after_first = state.batch_repo.find_by_id("B001").unwrap().unwrap();

    let second = api
        .recompute_batch_at("B001", RecalcTrigger::ManualRecompute, fixed_now())
        .await
        .unwrap();
    let row_after_second = state.batch_repo.find_by_id("B001").unwrap().unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(row_after_first, row_after_second);
    assert_eq!(api.list_recalc_history("B001", 10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_reprocess_all_单批次失败不中断() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    seed_batch(&state, "B002", -10, BatchStatus::Active);
    seed_batch(&state, "B003", 200, BatchStatus::Planning);
    state
        .report_repo
        .insert(&mortality("R1", "B001", "2025-06-02T08:00:00Z", 5))
        .unwrap();
    state
        .report_repo
        .insert(&mortality("R2", "B003", "2025-06-02T08:00:00Z", 2))
        .unwrap();

    let summary = state
        .batch_stats_api
        .reprocess_all_at(RecalcTrigger::ReprocessAll, fixed_now())
        .await
        .unwrap();

    assert_eq!(summary.batches_total, 3);
    assert_eq!(summary.batches_processed, 2);
    assert_eq!(summary.reports_processed, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].batch_id, "B002");

    let b3 = state.batch_repo.find_by_id("B003").unwrap().unwrap();
    assert_eq!(b3.current_mortality, 2);
    assert_eq!(b3.health_status, Some(HealthStatus::Excellent));

    let logs = state.batch_stats_api.list_recalc_history("B001", 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].run_id.as_deref(), Some(summary.run_id.as_str()));
    assert_eq!(logs[0].trigger, RecalcTrigger::ReprocessAll);
}

// ==========================================
// 输入校验
// ==========================================

#[tokio::test]
async fn test_invalid_input_and_not_found() {
    let (_tmp, state) = create_test_state();
    let api = &state.batch_stats_api;

    let err = api.get_statistics("  ", fixed_now()).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api.get_statistics("B404", fixed_now()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api
        .recompute_batch_at("B404", RecalcTrigger::ManualRecompute, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api
        .submit_report_at(mortality("R1", "B404", "2025-06-02T08:00:00Z", 1), fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api.list_recalc_history("B001", 0).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_submit_duplicate_report_id_is_conflict() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    let api = &state.batch_stats_api;

    api.submit_report_at(mortality("R1", "B001", "2025-06-02T08:00:00Z", 1), fixed_now())
        .await
        .unwrap();
    let err = api
        .submit_report_at(mortality("R1", "B001", "2025-06-02T09:00:00Z", 1), fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn test_negative_bird_count_is_invalid_input() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", -1, BatchStatus::Active);

    let err = state
        .batch_stats_api
        .get_statistics("B001", fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 配置阈值覆写
// ==========================================

#[tokio::test]
async fn test_configured_thresholds_apply() {
    let (_tmp, state) = create_test_state();
    seed_batch(&state, "B001", 500, BatchStatus::Active);
    state
        .report_repo
        .insert(&mortality("R1", "B001", "2025-06-02T08:00:00Z", 8))
        .unwrap();

    let cfg = &state.config_manager;
    cfg.set_global_config_value(config_keys::MORTALITY_POOR_THRESHOLD_PCT, "1.5")
        .unwrap();
    cfg.set_global_config_value(config_keys::MORTALITY_FAIR_THRESHOLD_PCT, "1.2")
        .unwrap();
    cfg.set_global_config_value(config_keys::MORTALITY_GOOD_THRESHOLD_PCT, "0.5")
        .unwrap();

    let snapshot = state
        .batch_stats_api
        .get_statistics("B001", fixed_now())
        .await
        .unwrap();
    assert_eq!(snapshot.mortality_rate_pct, 1.6);
    assert_eq!(snapshot.health_status, HealthStatus::Poor);
    assert_eq!(snapshot.health_score, 40);
}
