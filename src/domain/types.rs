// ==========================================
// 家禽批次管理系统 - 领域类型定义
// ==========================================
// 职责: 健康状态 / 批次状态 / 指标类别 / 报告类型 / 重算触发源
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 健康状态 (Health Status)
// ==========================================
// 由死亡率阈值判定, 顺序: Poor < Fair < Good < Excellent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Poor,      // 死亡率 > 5%
    Fair,      // 死亡率 > 3%
    Good,      // 死亡率 > 1%
    Excellent, // 其余
}

impl HealthStatus {
    /// 驾驶舱展示用健康分（固定映射，不是独立规则）
    pub fn health_score(&self) -> u32 {
        match self {
            HealthStatus::Excellent => 100,
            HealthStatus::Good => 80,
            HealthStatus::Fair => 60,
            HealthStatus::Poor => 40,
        }
    }

    /// 从数据库字符串解析（大小写不敏感）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Some(HealthStatus::Excellent),
            "good" => Some(HealthStatus::Good),
            "fair" => Some(HealthStatus::Fair),
            "poor" => Some(HealthStatus::Poor),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 批次状态 (Batch Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Planning,  // 计划中
    Active,    // 饲养中
    Completed, // 已出栏
    Archived,  // 已归档
}

impl BatchStatus {
    /// 从字符串解析状态，未知值回退为 Planning
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => BatchStatus::Active,
            "completed" => BatchStatus::Completed,
            "archived" => BatchStatus::Archived,
            _ => BatchStatus::Planning,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchStatus::Planning => "Planning",
            BatchStatus::Active => "Active",
            BatchStatus::Completed => "Completed",
            BatchStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 指标类别 (Metric Category)
// ==========================================
// 一份报告可同时归入多个类别（Daily 报告最常见）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricCategory {
    Mortality,
    Feed,
    Vaccination,
    Health, // 含温湿度等环境读数
    Weight,
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricCategory::Mortality => write!(f, "MORTALITY"),
            MetricCategory::Feed => write!(f, "FEED"),
            MetricCategory::Vaccination => write!(f, "VACCINATION"),
            MetricCategory::Health => write!(f, "HEALTH"),
            MetricCategory::Weight => write!(f, "WEIGHT"),
        }
    }
}

// ==========================================
// 报告类型 (Report Kind)
// ==========================================
// 由 type 标签归一化得到; 上游命名不统一, 未识别的归为 Other
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    Mortality,
    Feed,
    Vaccination,
    Health,
    Weight,
    Daily,
    Other(String),
}

impl ReportKind {
    /// 类型本身直接对应的指标类别（Daily/Other 没有）
    pub fn category(&self) -> Option<MetricCategory> {
        match self {
            ReportKind::Mortality => Some(MetricCategory::Mortality),
            ReportKind::Feed => Some(MetricCategory::Feed),
            ReportKind::Vaccination => Some(MetricCategory::Vaccination),
            ReportKind::Health => Some(MetricCategory::Health),
            ReportKind::Weight => Some(MetricCategory::Weight),
            ReportKind::Daily | ReportKind::Other(_) => None,
        }
    }
}

// ==========================================
// 重算触发源 (Recalc Trigger)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecalcTrigger {
    ReportSubmitted, // 新报告写入
    ManualRecompute, // 单批次手动重算
    ReprocessAll,    // 管理员全量重算
}

impl RecalcTrigger {
    pub fn from_db_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "REPORT_SUBMITTED" => RecalcTrigger::ReportSubmitted,
            "REPROCESS_ALL" => RecalcTrigger::ReprocessAll,
            _ => RecalcTrigger::ManualRecompute,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecalcTrigger::ReportSubmitted => "REPORT_SUBMITTED",
            RecalcTrigger::ManualRecompute => "MANUAL_RECOMPUTE",
            RecalcTrigger::ReprocessAll => "REPROCESS_ALL",
        }
    }
}

impl fmt::Display for RecalcTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_score_mapping() {
        assert_eq!(HealthStatus::Excellent.health_score(), 100);
        assert_eq!(HealthStatus::Good.health_score(), 80);
        assert_eq!(HealthStatus::Fair.health_score(), 60);
        assert_eq!(HealthStatus::Poor.health_score(), 40);
    }

    #[test]
    fn test_health_status_db_roundtrip_case_insensitive() {
        assert_eq!(HealthStatus::from_db_str("  fair "), Some(HealthStatus::Fair));
        assert_eq!(HealthStatus::from_db_str("EXCELLENT"), Some(HealthStatus::Excellent));
        assert_eq!(HealthStatus::from_db_str("unknown"), None);
    }

    #[test]
    fn test_batch_status_unknown_falls_back_to_planning() {
        assert_eq!(BatchStatus::from_db_str("active"), BatchStatus::Active);
        assert_eq!(BatchStatus::from_db_str("???"), BatchStatus::Planning);
    }

    #[test]
    fn test_report_kind_category() {
        assert_eq!(ReportKind::Feed.category(), Some(MetricCategory::Feed));
        assert_eq!(ReportKind::Daily.category(), None);
        assert_eq!(ReportKind::Other("equipment".to_string()).category(), None);
    }
}
