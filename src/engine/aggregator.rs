// ==========================================
// 家禽批次管理系统 - 报告聚合器
// ==========================================
// 职责: 按时间正序折叠报告 → 分类别累计值 + 历史列表
// 红线: 纯计算, 不读时钟, 不落库; 同样输入必须得到完全相同的输出
// ==========================================

use crate::domain::report::Report;
use crate::domain::snapshot::{FeedEvent, HealthReading, MortalityEvent, VaccinationEvent, WeightReading};
use crate::domain::types::{MetricCategory, ReportKind};
use crate::engine::classifier::ReportClassifier;
use crate::engine::field_resolver::ResolvedMetrics;

// ==========================================
// AggregateTotals - 聚合结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTotals {
    // ===== 累计值 =====
    pub total_mortality: u64,
    pub total_feed_used: f64,
    pub total_vaccinations: u64,

    // ===== 环境读数 (求平均用) =====
    pub temperature_sum: f64,
    pub temperature_count: usize,
    pub humidity_sum: f64,
    pub humidity_count: usize,

    // ===== 体重: 求和/计数 + 最近一次 =====
    pub weight_sum: f64,
    pub weight_count: usize,
    pub latest_weight: Option<f64>,

    // ===== 历史 =====
    pub mortality_history: Vec<MortalityEvent>,
    pub feed_history: Vec<FeedEvent>,
    pub health_history: Vec<HealthReading>,
    pub vaccination_history: Vec<VaccinationEvent>,
    pub weight_history: Vec<WeightReading>,

    // ===== 计数 =====
    pub reports_processed: usize,
    pub unclassified_reports: usize,
}

impl AggregateTotals {
    pub fn average_temperature(&self) -> Option<f64> {
        (self.temperature_count > 0).then(|| self.temperature_sum / self.temperature_count as f64)
    }

    pub fn average_humidity(&self) -> Option<f64> {
        (self.humidity_count > 0).then(|| self.humidity_sum / self.humidity_count as f64)
    }

    pub fn average_weight(&self) -> Option<f64> {
        (self.weight_count > 0).then(|| self.weight_sum / self.weight_count as f64)
    }

    /// 折叠单份报告
    pub fn accumulate(&mut self, report: &Report) {
        self.reports_processed += 1;

        let kind = ReportClassifier::kind_of(&report.type_tag);
        let categories = ReportClassifier::classify(&kind, &report.fields);

        if categories.is_empty() {
            self.unclassified_reports += 1;
            if let ReportKind::Other(tag) = &kind {
                tracing::debug!(report_id = %report.id, tag = %tag, "未识别的报告类型，跳过");
            }
            return;
        }

        let metrics = ResolvedMetrics::from_fields(&report.fields);

        for category in categories {
            match category {
                MetricCategory::Mortality => self.add_mortality(report, &metrics),
                MetricCategory::Feed => self.add_feed(report, &metrics),
                MetricCategory::Vaccination => self.add_vaccination(report, &metrics),
                MetricCategory::Health => self.add_health(report, &metrics),
                MetricCategory::Weight => self.add_weight(report, &metrics),
            }
        }
    }

    fn add_mortality(&mut self, report: &Report, metrics: &ResolvedMetrics) {
        let Some(count) = positive_count(metrics.mortality_count) else {
            return;
        };
        self.total_mortality = self.total_mortality.saturating_add(count);
        self.mortality_history.push(MortalityEvent {
            timestamp: report.created_at.clone(),
            count,
            cause: metrics.death_cause.clone(),
            report_id: report.id.clone(),
        });
    }

    fn add_feed(&mut self, report: &Report, metrics: &ResolvedMetrics) {
        let Some(amount) = metrics.feed_amount.filter(|a| *a > 0.0) else {
            return;
        };
        self.total_feed_used += amount;
        self.feed_history.push(FeedEvent {
            timestamp: report.created_at.clone(),
            amount,
            feed_type: metrics.feed_type.clone(),
            report_id: report.id.clone(),
        });
    }

    fn add_vaccination(&mut self, report: &Report, metrics: &ResolvedMetrics) {
        let Some(count) = positive_count(metrics.vaccination_count) else {
            return;
        };
        self.total_vaccinations = self.total_vaccinations.saturating_add(count);
        self.vaccination_history.push(VaccinationEvent {
            timestamp: report.created_at.clone(),
            count,
            vaccine_name: metrics.vaccine_name.clone(),
            report_id: report.id.clone(),
        });
    }

    fn add_health(&mut self, report: &Report, metrics: &ResolvedMetrics) {
        if let Some(t) = metrics.temperature {
            self.temperature_sum += t;
            self.temperature_count += 1;
        }
        if let Some(h) = metrics.humidity {
            self.humidity_sum += h;
            self.humidity_count += 1;
        }

        if metrics.temperature.is_none() && metrics.humidity.is_none() && metrics.health_status.is_none() {
            return;
        }
        self.health_history.push(HealthReading {
            timestamp: report.created_at.clone(),
            temperature: metrics.temperature,
            humidity: metrics.humidity,
            status_note: metrics.health_status.clone(),
            report_id: report.id.clone(),
        });
    }

    fn add_weight(&mut self, report: &Report, metrics: &ResolvedMetrics) {
        let Some(weight) = metrics.weight.filter(|w| *w > 0.0) else {
            return;
        };
        self.weight_sum += weight;
        self.weight_count += 1;
        self.latest_weight = Some(weight);
        self.weight_history.push(WeightReading {
            timestamp: report.created_at.clone(),
            weight,
            report_id: report.id.clone(),
        });
    }
}

fn positive_count(value: Option<i64>) -> Option<u64> {
    value.filter(|v| *v > 0).and_then(|v| u64::try_from(v).ok())
}

// ==========================================
// Aggregator
// ==========================================
pub struct Aggregator;

impl Aggregator {
    /// 聚合报告列表（调用方保证时间正序）
    pub fn aggregate(reports: &[Report]) -> AggregateTotals {
        reports.iter().fold(AggregateTotals::default(), |mut totals, report| {
            totals.accumulate(report);
            totals
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{FieldBag, FieldValue};

    fn report(id: &str, tag: &str, ts: &str, entries: &[(&str, FieldValue)]) -> Report {
        let fields: FieldBag = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Report::new(id, "B1", tag, ts, fields)
    }

    #[test]
    fn test_empty_list() {
        let totals = Aggregator::aggregate(&[]);
        assert_eq!(totals, AggregateTotals::default());
        assert_eq!(totals.average_weight(), None);
    }

    #[test]
    fn test_mortality_totals_and_history() {
        let reports = vec![
            report("r1", "Mortality", "2025-03-01T08:00:00Z", &[("deathCount", 5.into()), ("cause", "heat".into())]),
            report("r2", "mortality", "2025-03-02T08:00:00Z", &[("mortalityCount", "3".into())]),
        ];

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.total_mortality, 8);
        assert_eq!(totals.mortality_history.len(), 2);
        assert_eq!(totals.mortality_history[0].cause.as_deref(), Some("heat"));
        assert_eq!(totals.mortality_history[1].report_id, "r2");
    }

    #[test]
    fn test_non_positive_counts_are_ignored() {
        let reports = vec![
            report("r1", "Mortality", "2025-03-01", &[("deathCount", 0.into())]),
            report("r2", "Mortality", "2025-03-02", &[("deathCount", (-2).into())]),
            report("r3", "Mortality", "2025-03-03", &[("deathCount", "many".into())]),
        ];

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.total_mortality, 0);
        assert!(totals.mortality_history.is_empty());
        assert_eq!(totals.reports_processed, 3);
    }

    #[test]
    fn test_weight_latest_and_average() {
        let reports = vec![
            report("r1", "Weight", "2025-03-01", &[("averageWeight", 1.0.into())]),
            report("r2", "Equipment", "2025-03-02", &[("birdWeight", 1.8.into())]),
            report("r3", "Daily", "2025-03-03", &[("weight", 1.5.into())]),
        ];

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.weight_count, 3);
        assert_eq!(totals.latest_weight, Some(1.5));
        let avg = totals.average_weight().unwrap();
        assert!((avg - 4.3 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_environment_and_health_share_readings() {
        let reports = vec![
            report("r1", "Health", "2025-03-01", &[("temperature", 30.0.into()), ("healthStatus", "ok".into())]),
            report("r2", "Environment", "2025-03-02", &[("temp", 32.0.into()), ("humidity", 60.0.into())]),
            report("r3", "Daily", "2025-03-03", &[("humidity", 70.0.into())]),
            // 非 Daily 且非环境类型 → 温度不计入
            report("r4", "Feed", "2025-03-04", &[("temperature", 99.0.into())]),
        ];

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.average_temperature(), Some(31.0));
        assert_eq!(totals.average_humidity(), Some(65.0));
        assert_eq!(totals.health_history.len(), 3);
        assert_eq!(totals.health_history[0].status_note.as_deref(), Some("ok"));
    }

    #[test]
    fn test_unclassified_reports_counted() {
        let reports = vec![report("r1", "Inventory", "2025-03-01", &[("deathCount", 4.into())])];

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.total_mortality, 0);
        assert_eq!(totals.unclassified_reports, 1);
        assert_eq!(totals.reports_processed, 1);
    }

    #[test]
    fn test_vaccination_and_feed() {
        let reports = vec![
            report(
                "r1",
                "Vaccination",
                "2025-03-01",
                &[("vaccinatedBirds", 450.into()), ("vaccineName", "Newcastle".into())],
            ),
            report("r2", "Feed Report", "2025-03-02", &[("feedAmount", "25.5".into()), ("feedType", "starter".into())]),
            report("r3", "Daily", "2025-03-03", &[("feedUsed", 14.5.into())]),
        ];

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.total_vaccinations, 450);
        assert_eq!(totals.vaccination_history[0].vaccine_name.as_deref(), Some("Newcastle"));
        assert!((totals.total_feed_used - 40.0).abs() < 1e-9);
        assert_eq!(totals.feed_history[0].feed_type.as_deref(), Some("starter"));
    }

    #[test]
    fn test_aggregate_deterministic() {
        let reports = vec![
            report("r1", "Daily", "2025-03-01", &[("deathCount", 1.into()), ("feedUsed", 0.1.into())]),
            report("r2", "Daily", "2025-03-02", &[("feedUsed", 0.2.into()), ("temperature", 28.3.into())]),
        ];

        assert_eq!(Aggregator::aggregate(&reports), Aggregator::aggregate(&reports));
    }

    #[test]
    fn test_huge_counts_saturate() {
        let reports: Vec<Report> = (0..3)
            .map(|i| {
                report(
                    &format!("r{}", i),
                    "Mortality",
                    "2025-03-01",
                    &[("deathCount", 9.0e18.into())],
                )
            })
            .chain((0..3).map(|i| {
                report(&format!("v{}", i), "Vaccination", "2025-03-02", &[("vaccinatedBirds", 9.0e18.into())])
            }))
            .collect();

        let totals = Aggregator::aggregate(&reports);

        assert_eq!(totals.total_mortality, u64::MAX);
        assert_eq!(totals.total_vaccinations, u64::MAX);
        assert_eq!(totals.mortality_history.len(), 3);
    }
}
