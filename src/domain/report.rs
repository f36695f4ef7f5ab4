// ==========================================
// 家禽批次管理系统 - 报告领域模型
// ==========================================
// 职责: 定义报告实体与松散字段包 (field bag)
// 红线: 统计引擎只读报告, 不修改报告
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ==========================================
// FieldValue - 字段包中的单个取值
// ==========================================
// 上游表单提交路径不同, 同一数量可能是数字、字符串或布尔
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// 是否视为"空"（Null 或空白字符串）
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(f64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// 字段包: 有序映射, 保证遍历顺序稳定
pub type FieldBag = BTreeMap<String, FieldValue>;

// ==========================================
// Report - 报告
// ==========================================
// 对齐: reports 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,              // 报告ID
    #[serde(default)]
    pub batch_id: String,        // 所属批次
    pub type_tag: String,        // 类型标签（大小写/命名不统一）
    pub created_at: String,      // 创建时间 (ISO-8601)
    #[serde(default)]
    pub fields: FieldBag,        // 字段包
    #[serde(default)]
    pub processed: bool,         // 已处理标注（引擎忽略）
}

impl Report {
    /// 创建报告（processed = false）
    pub fn new(
        id: impl Into<String>,
        batch_id: impl Into<String>,
        type_tag: impl Into<String>,
        created_at: impl Into<String>,
        fields: FieldBag,
    ) -> Self {
        Self {
            id: id.into(),
            batch_id: batch_id.into(),
            type_tag: type_tag.into(),
            created_at: created_at.into(),
            fields,
            processed: false,
        }
    }

    /// 创建时间对应的时刻（无法解析时为 None）
    pub fn created_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// 时间正序比较: 先按时刻, 无法解析的排在最前; 同一时刻按原文与报告ID
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.created_instant()
            .cmp(&other.created_instant())
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// 解析时间戳
///
/// 支持: RFC 3339 / `YYYY-MM-DDTHH:MM:SS[.f]` / `YYYY-MM-DD HH:MM:SS[.f]` / `YYYY-MM-DD`
/// 无时区的值按 UTC 处理
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 规范化为 UTC RFC 3339（`Z` 后缀, 小数秒按需保留）
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
