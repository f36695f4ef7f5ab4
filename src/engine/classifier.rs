// ==========================================
// 家禽批次管理系统 - 报告分类器
// ==========================================
// 职责: type 标签 + 字段包 → 报告贡献的指标类别集合
// 规则: 类型直接命名该类别, 或类型为 Daily 且该类别主数量的别名存在
// 例外: 体重不看类型, 任何报告只要带体重字段即归入 Weight
// ==========================================

use crate::domain::report::{FieldBag, Report};
use crate::domain::types::{MetricCategory, ReportKind};
use crate::engine::field_resolver::{FieldResolver, Quantity};
use std::collections::BTreeSet;

// ==========================================
// 类型同义词表（各入口出现过的写法取并集）
// ==========================================
// 已归一化: 小写, '_' '-' 与连续空白折叠为单个空格
const MORTALITY_TAGS: &[&str] = &["mortality", "mortality report", "death", "deaths", "death report"];
const FEED_TAGS: &[&str] = &["feed", "feed report", "feeding", "feed usage", "feed consumption"];
const VACCINATION_TAGS: &[&str] = &[
    "vaccination",
    "vaccination report",
    "vaccinations",
    "vaccine",
    "vaccine report",
];
// Environment 与 Health 共用同一温湿度口径
const HEALTH_TAGS: &[&str] = &[
    "health",
    "health report",
    "health check",
    "environment",
    "environment report",
    "environmental",
];
const WEIGHT_TAGS: &[&str] = &["weight", "weight report", "weighing", "weight check"];
const DAILY_TAGS: &[&str] = &["daily", "daily report", "daily update", "daily log"];

/// 归一化类型标签
pub fn normalize_tag(tag: &str) -> String {
    tag.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ==========================================
// ReportClassifier
// ==========================================
pub struct ReportClassifier;

impl ReportClassifier {
    /// 解析报告类型
    pub fn kind_of(type_tag: &str) -> ReportKind {
        let normalized = normalize_tag(type_tag);
        let tag = normalized.as_str();

        if MORTALITY_TAGS.contains(&tag) {
            ReportKind::Mortality
        } else if FEED_TAGS.contains(&tag) {
            ReportKind::Feed
        } else if VACCINATION_TAGS.contains(&tag) {
            ReportKind::Vaccination
        } else if HEALTH_TAGS.contains(&tag) {
            ReportKind::Health
        } else if WEIGHT_TAGS.contains(&tag) {
            ReportKind::Weight
        } else if DAILY_TAGS.contains(&tag) {
            ReportKind::Daily
        } else {
            ReportKind::Other(normalized)
        }
    }

    /// 分类（按类型 + 字段存在性）
    pub fn classify(kind: &ReportKind, fields: &FieldBag) -> BTreeSet<MetricCategory> {
        let mut categories = BTreeSet::new();

        if let Some(category) = kind.category() {
            categories.insert(category);
        }

        if matches!(kind, ReportKind::Daily) {
            if FieldResolver::has_quantity(fields, Quantity::MortalityCount) {
                categories.insert(MetricCategory::Mortality);
            }
            if FieldResolver::has_quantity(fields, Quantity::FeedAmount) {
                categories.insert(MetricCategory::Feed);
            }
            if FieldResolver::has_quantity(fields, Quantity::VaccinationCount) {
                categories.insert(MetricCategory::Vaccination);
            }
            if FieldResolver::has_quantity(fields, Quantity::Temperature)
                || FieldResolver::has_quantity(fields, Quantity::Humidity)
            {
                categories.insert(MetricCategory::Health);
            }
        }

        // 体重不做类型门控
        if FieldResolver::has_quantity(fields, Quantity::Weight) {
            categories.insert(MetricCategory::Weight);
        }

        categories
    }

    pub fn classify_report(report: &Report) -> BTreeSet<MetricCategory> {
        Self::classify(&Self::kind_of(&report.type_tag), &report.fields)
    }
}
