// ==========================================
// 家禽批次管理系统 - 报告数据仓储
// ==========================================
// 职责: 报告写入、按批次读取（时间升序）、处理标注
// 存储: reports 表, 字段包以 JSON 文本落库
// ==========================================

use crate::domain::report::{FieldBag, Report};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ReportRepository - 报告仓储
// ==========================================
pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入报告
    ///
    /// # 返回
    /// - Err(ForeignKeyViolation): 所属批次不存在
    pub fn insert(&self, report: &Report) -> RepositoryResult<()> {
        let fields_json = serde_json::to_string(&report.fields)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reports (report_id, batch_id, report_type, created_at, fields_json, processed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                report.id,
                report.batch_id,
                report.type_tag,
                report.created_at,
                fields_json,
                report.processed as i32,
            ],
        )?;
        Ok(())
    }

    /// 按批次读取全部报告（按时刻升序, 同时刻按原文与 report_id）
    ///
    /// created_at 可能混用时区偏移与格式, 排序在解析后进行, 不依赖文本序
    pub fn find_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<Report>> {
        let rows = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT report_id, batch_id, report_type, created_at, fields_json, processed
                FROM reports
                WHERE batch_id = ?1
                "#,
            )?;

            let rows = stmt
                .query_map(params![batch_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i32>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut reports = rows
            .into_iter()
            .map(|(id, batch_id, type_tag, created_at, fields_json, processed)| {
                let fields: FieldBag =
                    serde_json::from_str(&fields_json).map_err(|e| RepositoryError::FieldValueError {
                        field: "fields_json".to_string(),
                        message: format!("报告 {} 字段包解析失败: {}", id, e),
                    })?;
                Ok(Report {
                    id,
                    batch_id,
                    type_tag,
                    created_at,
                    fields,
                    processed: processed != 0,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        reports.sort_by(Report::chronological_cmp);
        Ok(reports)
    }
}

/// 标注报告为已处理（只标注本次参与计算的报告）
///
/// 仅用于审计展示, 统计引擎读取时不过滤该标注; 由调用方提供事务
pub(crate) fn mark_processed(conn: &Connection, batch_id: &str, report_ids: &[String]) -> RepositoryResult<usize> {
    let mut stmt = conn.prepare(
        "UPDATE reports SET processed = 1 WHERE batch_id = ?1 AND report_id = ?2 AND processed = 0",
    )?;
    let mut rows = 0;
    for report_id in report_ids {
        rows += stmt.execute(params![batch_id, report_id])?;
    }
    Ok(rows)
}
