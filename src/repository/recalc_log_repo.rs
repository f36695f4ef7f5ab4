// ==========================================
// 家禽批次管理系统 - 重算日志仓储
// ==========================================
// 红线: 只追加, 不更新
// ==========================================

use crate::domain::recalc_log::RecalcLog;
use crate::domain::types::{HealthStatus, RecalcTrigger};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct RecalcLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecalcLogRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询批次重算历史（新 → 旧）
    pub fn find_by_batch(&self, batch_id: &str, limit: i32) -> RepositoryResult<Vec<RecalcLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, batch_id, run_id, trigger_source,
                   reports_processed, total_mortality, health_status, recalc_ts
            FROM stats_recalc_log
            WHERE batch_id = ?1
            ORDER BY recalc_ts DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let logs = stmt
            .query_map(params![batch_id, limit], |row| {
                let health_raw: String = row.get(6)?;
                let ts_raw: String = row.get(7)?;
                Ok(RecalcLog {
                    log_id: row.get(0)?,
                    batch_id: row.get(1)?,
                    run_id: row.get(2)?,
                    trigger: RecalcTrigger::from_db_str(&row.get::<_, String>(3)?),
                    reports_processed: row.get(4)?,
                    total_mortality: row.get(5)?,
                    health_status: HealthStatus::from_db_str(&health_raw)
                        .unwrap_or(HealthStatus::Excellent),
                    recalc_ts: NaiveDateTime::parse_from_str(&ts_raw, TS_FORMAT).unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }
}

/// 追加一条重算日志（由调用方提供事务）
pub(crate) fn insert_recalc_log(conn: &Connection, log: &RecalcLog) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO stats_recalc_log (
            log_id, batch_id, run_id, trigger_source,
            reports_processed, total_mortality, health_status, recalc_ts
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            log.log_id,
            log.batch_id,
            log.run_id,
            log.trigger.to_db_str(),
            log.reports_processed,
            log.total_mortality,
            log.health_status.to_db_str(),
            log.recalc_ts.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}
