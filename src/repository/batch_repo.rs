// ==========================================
// 家禽批次管理系统 - 批次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发: 派生字段整体覆盖写, 最后写入者生效, 不做版本校验
// ==========================================

use crate::domain::batch::{Batch, BatchDerivedFields, BatchProfile};
use crate::domain::recalc_log::RecalcLog;
use crate::domain::types::{BatchStatus, HealthStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::recalc_log_repo::insert_recalc_log;
use crate::repository::report_repo::mark_processed;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"
    batch_id, batch_name, farmer_id, original_bird_count, start_date, status,
    current_mortality, health_status, feed_used, current_weight, temperature, humidity,
    vaccination_count, created_at, updated_at
"#;

// ==========================================
// BatchRepository - 批次仓储
// ==========================================
pub struct BatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建批次
    pub fn insert(&self, batch: &Batch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO batches (
                batch_id, batch_name, farmer_id, original_bird_count, start_date, status,
                current_mortality, health_status, feed_used, current_weight, temperature, humidity,
                vaccination_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                batch.batch_id,
                batch.batch_name,
                batch.farmer_id,
                batch.original_bird_count,
                batch.start_date,
                batch.status.to_db_str(),
                batch.current_mortality,
                batch.health_status.map(|s| s.to_db_str()),
                batch.feed_used,
                batch.current_weight,
                batch.temperature,
                batch.humidity,
                batch.vaccination_count,
                batch.created_at.format(TS_FORMAT).to_string(),
                batch.updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM batches WHERE batch_id = ?1", SELECT_COLUMNS);
        let batch = conn
            .query_row(&sql, params![batch_id], map_batch_row)
            .optional()?;
        Ok(batch)
    }

    /// 查询全部批次（按创建时间）
    pub fn list_all(&self) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM batches ORDER BY created_at ASC, batch_id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let batches = stmt
            .query_map([], map_batch_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    /// 查询统计引擎输入
    ///
    /// # 返回
    /// - Err(NotFound): 批次不存在
    /// - Err(FieldValueError): original_bird_count 为负（前置条件违反）
    pub fn find_profile(&self, batch_id: &str) -> RepositoryResult<BatchProfile> {
        let batch = self.find_by_id(batch_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Batch".to_string(),
            id: batch_id.to_string(),
        })?;
        to_profile(&batch)
    }

    /// 持久化一次重算结果（单事务）
    ///
    /// 1. 覆盖写派生字段（last write wins）
    /// 2. 标注本次参与计算的报告为已处理
    /// 3. 追加重算日志
    ///
    /// 任一步失败整体回滚
    ///
    /// # 返回
    /// - Ok(usize): 新标注为已处理的报告数
    /// - Err(NotFound): 批次不存在
    pub fn persist_recompute(
        &self,
        batch_id: &str,
        fields: &BatchDerivedFields,
        report_ids: &[String],
        log: &RecalcLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        update_derived_fields(&tx, batch_id, fields, log.recalc_ts)?;
        let marked = mark_processed(&tx, batch_id, report_ids)?;
        insert_recalc_log(&tx, log)?;

        tx.commit()?;
        Ok(marked)
    }
}

/// 覆盖写派生字段
fn update_derived_fields(
    conn: &Connection,
    batch_id: &str,
    fields: &BatchDerivedFields,
    updated_at: NaiveDateTime,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        r#"
        UPDATE batches SET
            current_mortality = ?2,
            health_status = ?3,
            feed_used = ?4,
            current_weight = ?5,
            temperature = ?6,
            humidity = ?7,
            vaccination_count = ?8,
            updated_at = ?9
        WHERE batch_id = ?1
        "#,
        params![
            batch_id,
            fields.current_mortality,
            fields.health_status.to_db_str(),
            fields.feed_used,
            fields.current_weight,
            fields.temperature,
            fields.humidity,
            fields.vaccination_count,
            updated_at.format(TS_FORMAT).to_string(),
        ],
    )?;

    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "Batch".to_string(),
            id: batch_id.to_string(),
        });
    }
    Ok(())
}

/// 批次行 → 统计引擎输入
pub fn to_profile(batch: &Batch) -> RepositoryResult<BatchProfile> {
    let original_bird_count =
        u64::try_from(batch.original_bird_count).map_err(|_| RepositoryError::FieldValueError {
            field: "original_bird_count".to_string(),
            message: format!("批次 {} 初始数量为负: {}", batch.batch_id, batch.original_bird_count),
        })?;

    Ok(BatchProfile {
        id: batch.batch_id.clone(),
        original_bird_count,
        start_date: batch.start_date.clone(),
        last_known_current_weight: batch.current_weight,
        last_known_temperature: batch.temperature,
        last_known_humidity: batch.humidity,
    })
}

fn parse_ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).unwrap_or_default()
}

fn map_batch_row(row: &Row<'_>) -> rusqlite::Result<Batch> {
    Ok(Batch {
        batch_id: row.get(0)?,
        batch_name: row.get(1)?,
        farmer_id: row.get(2)?,
        original_bird_count: row.get(3)?,
        start_date: row.get(4)?,
        status: BatchStatus::from_db_str(&row.get::<_, String>(5)?),
        current_mortality: row.get(6)?,
        health_status: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| HealthStatus::from_db_str(&s)),
        feed_used: row.get(8)?,
        current_weight: row.get(9)?,
        temperature: row.get(10)?,
        humidity: row.get(11)?,
        vaccination_count: row.get(12)?,
        created_at: parse_ts(&row.get::<_, String>(13)?),
        updated_at: parse_ts(&row.get::<_, String>(14)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{FieldBag, Report};
    use crate::domain::types::RecalcTrigger;
    use crate::repository::report_repo::ReportRepository;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn setup() -> BatchRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        BatchRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_find_by_id() {
        let repo = setup();
        let mut batch = Batch::new("B001", "一号舍", 500, "2025-06-01", ts(1));
        batch.farmer_id = Some("F01".to_string());
        batch.status = BatchStatus::Active;
        repo.insert(&batch).unwrap();

        let found = repo.find_by_id("B001").unwrap().unwrap();
        assert_eq!(found, batch);
        assert!(repo.find_by_id("B404").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_unique_violation() {
        let repo = setup();
        let batch = Batch::new("B001", "一号舍", 500, "2025-06-01", ts(1));
        repo.insert(&batch).unwrap();

        let err = repo.insert(&batch).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_find_profile_carries_last_known_values() {
        let repo = setup();
        let mut batch = Batch::new("B001", "一号舍", 500, "2025-06-01", ts(1));
        batch.current_weight = Some(1.8);
        batch.temperature = Some(24.5);
        repo.insert(&batch).unwrap();

        let profile = repo.find_profile("B001").unwrap();
        assert_eq!(profile.original_bird_count, 500);
        assert_eq!(profile.last_known_current_weight, Some(1.8));
        assert_eq!(profile.last_known_temperature, Some(24.5));
        assert_eq!(profile.last_known_humidity, None);
    }

    #[test]
    fn test_find_profile_errors() {
        let repo = setup();
        repo.insert(&Batch::new("NEG", "异常批次", -3, "2025-06-01", ts(1)))
            .unwrap();

        assert!(matches!(
            repo.find_profile("B404").unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
        assert!(matches!(
            repo.find_profile("NEG").unwrap_err(),
            RepositoryError::FieldValueError { .. }
        ));
    }

    fn derived(mortality: i64, status: HealthStatus) -> BatchDerivedFields {
        BatchDerivedFields {
            current_mortality: mortality,
            health_status: status,
            feed_used: 120.0,
            current_weight: 1.2,
            temperature: 25.0,
            humidity: 60.0,
            vaccination_count: 0,
        }
    }

    fn recalc_log(log_id: &str, batch_id: &str, at: NaiveDateTime) -> RecalcLog {
        RecalcLog {
            log_id: log_id.to_string(),
            batch_id: batch_id.to_string(),
            run_id: None,
            trigger: RecalcTrigger::ManualRecompute,
            reports_processed: 1,
            total_mortality: 8,
            health_status: HealthStatus::Good,
            recalc_ts: at,
        }
    }

    #[test]
    fn test_persist_recompute_overwrites() {
        let repo = setup();
        repo.insert(&Batch::new("B001", "一号舍", 500, "2025-06-01", ts(1)))
            .unwrap();

        repo.persist_recompute("B001", &derived(8, HealthStatus::Good), &[], &recalc_log("L1", "B001", ts(2)))
            .unwrap();
        repo.persist_recompute("B001", &derived(30, HealthStatus::Poor), &[], &recalc_log("L2", "B001", ts(3)))
            .unwrap();

        let found = repo.find_by_id("B001").unwrap().unwrap();
        assert_eq!(found.current_mortality, 30);
        assert_eq!(found.health_status, Some(HealthStatus::Poor));
        assert_eq!(found.feed_used, 120.0);
        assert_eq!(found.current_weight, Some(1.2));
        assert_eq!(found.updated_at, ts(3));
        assert_eq!(found.created_at, ts(1));
    }

    #[test]
    fn test_persist_recompute_missing_batch_is_not_found() {
        let repo = setup();
        let err = repo
            .persist_recompute("B404", &derived(0, HealthStatus::Excellent), &[], &recalc_log("L1", "B404", ts(2)))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_persist_recompute_rolls_back_when_log_fails() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = BatchRepository::from_connection(conn.clone());
        let report_repo = ReportRepository::from_connection(conn);

        repo.insert(&Batch::new("B001", "一号舍", 500, "2025-06-01", ts(1)))
            .unwrap();
        report_repo
            .insert(&Report::new("R1", "B001", "Mortality", "2025-06-02T08:00:00Z", FieldBag::new()))
            .unwrap();
        repo.persist_recompute("B001", &derived(8, HealthStatus::Good), &[], &recalc_log("L1", "B001", ts(2)))
            .unwrap();

        // 日志ID重复 → 第三步失败, 前两步一并回滚
        let ids = vec!["R1".to_string()];
        let err = repo
            .persist_recompute("B001", &derived(30, HealthStatus::Poor), &ids, &recalc_log("L1", "B001", ts(3)))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

        let found = repo.find_by_id("B001").unwrap().unwrap();
        assert_eq!(found.current_mortality, 8);
        assert_eq!(found.health_status, Some(HealthStatus::Good));
        assert_eq!(found.updated_at, ts(2));
        assert!(!report_repo.find_by_batch("B001").unwrap()[0].processed);
    }

    #[test]
    fn test_list_all_orders_by_created_at() {
        let repo = setup();
        repo.insert(&Batch::new("B002", "二号舍", 300, "2025-06-02", ts(2)))
            .unwrap();
        repo.insert(&Batch::new("B001", "一号舍", 500, "2025-06-01", ts(1)))
            .unwrap();

        let all = repo.list_all().unwrap();
        let ids: Vec<&str> = all.iter().map(|b| b.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["B001", "B002"]);
        assert_eq!(all[1].status, BatchStatus::Planning);
    }
}
