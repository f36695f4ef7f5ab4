// ==========================================
// 家禽批次管理系统 - 字段解析器
// ==========================================
// 职责: 字段包 + 别名表 → 标准数量 + 类型转换
// 红线: 每个数量只有一张别名表, 所有调用方共用
// 红线: 转换失败视为缺失 (None), 不是 0
// ==========================================

use crate::domain::report::{FieldBag, FieldValue};

// ==========================================
// 标准别名表（按优先级排列）
// ==========================================
pub mod aliases {
    // 死亡
    pub const MORTALITY_COUNT: &[&str] = &[
        "mortalityCount",
        "deathCount",
        "death_count",
        "mortality_count",
        "deaths",
        "numberOfDeaths",
    ];
    pub const DEATH_CAUSE: &[&str] = &["cause", "deathCause", "death_cause", "causeOfDeath", "mortalityCause"];

    // 饲料
    pub const FEED_AMOUNT: &[&str] = &[
        "feedUsed",
        "feedAmount",
        "feed_used",
        "feed_amount",
        "feedQuantity",
        "feedConsumed",
    ];
    pub const FEED_TYPE: &[&str] = &["feedType", "feed_type", "feedName"];

    // 免疫
    pub const VACCINATION_COUNT: &[&str] = &[
        "vaccinationCount",
        "vaccinatedBirds",
        "vaccinated_count",
        "birdsVaccinated",
        "vaccination_count",
    ];
    pub const VACCINE_NAME: &[&str] = &["vaccineName", "vaccine_name", "vaccineType", "vaccine"];

    // 环境
    pub const TEMPERATURE: &[&str] = &["temperature", "temp", "averageTemperature"];
    pub const HUMIDITY: &[&str] = &["humidity", "averageHumidity", "relativeHumidity"];

    // 体重
    pub const WEIGHT: &[&str] = &[
        "averageWeight",
        "birdWeight",
        "weight",
        "currentWeight",
        "average_weight",
        "avgWeight",
    ];

    // 健康
    pub const HEALTH_STATUS: &[&str] = &["healthStatus", "health_status", "condition"];
}

// ==========================================
// Quantity - 语义数量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    MortalityCount,
    DeathCause,
    FeedAmount,
    FeedType,
    VaccinationCount,
    VaccineName,
    Temperature,
    Humidity,
    Weight,
    HealthStatus,
}

impl Quantity {
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Quantity::MortalityCount => aliases::MORTALITY_COUNT,
            Quantity::DeathCause => aliases::DEATH_CAUSE,
            Quantity::FeedAmount => aliases::FEED_AMOUNT,
            Quantity::FeedType => aliases::FEED_TYPE,
            Quantity::VaccinationCount => aliases::VACCINATION_COUNT,
            Quantity::VaccineName => aliases::VACCINE_NAME,
            Quantity::Temperature => aliases::TEMPERATURE,
            Quantity::Humidity => aliases::HUMIDITY,
            Quantity::Weight => aliases::WEIGHT,
            Quantity::HealthStatus => aliases::HEALTH_STATUS,
        }
    }
}

// ==========================================
// FromFieldValue - 目标类型转换
// ==========================================
pub trait FromFieldValue: Sized {
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FromFieldValue for f64 {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        let v = match value {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Bool(_) | FieldValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl FromFieldValue for i64 {
    /// 带小数的值向零截断（"3.7" → 3）
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
            _ => None,
        }
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            FieldValue::Number(n) if n.is_finite() => Some(n.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

// ==========================================
// FieldResolver
// ==========================================
pub struct FieldResolver;

impl FieldResolver {
    /// 按别名优先级返回第一个存在且非空的原始值
    pub fn first_present<'a>(fields: &'a FieldBag, aliases: &[&str]) -> Option<&'a FieldValue> {
        aliases
            .iter()
            .filter_map(|alias| fields.get(*alias))
            .find(|value| !value.is_blank())
    }

    /// 解析并转换为目标类型
    ///
    /// 取第一个存在且非空的值做转换; 转换失败返回 None,
    /// 不会继续尝试后面的别名
    pub fn resolve<T: FromFieldValue>(fields: &FieldBag, aliases: &[&str]) -> Option<T> {
        Self::first_present(fields, aliases).and_then(T::from_field_value)
    }

    pub fn resolve_quantity<T: FromFieldValue>(fields: &FieldBag, quantity: Quantity) -> Option<T> {
        Self::resolve(fields, quantity.aliases())
    }

    /// 是否存在任一别名（非空即可, 不要求可解析）
    pub fn has_any(fields: &FieldBag, aliases: &[&str]) -> bool {
        Self::first_present(fields, aliases).is_some()
    }

    pub fn has_quantity(fields: &FieldBag, quantity: Quantity) -> bool {
        Self::has_any(fields, quantity.aliases())
    }
}

// ==========================================
// ResolvedMetrics - 单份报告解析结果
// ==========================================
// 每份报告只解析一次, 下游不再接触原始字段包
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetrics {
    pub mortality_count: Option<i64>,
    pub death_cause: Option<String>,
    pub feed_amount: Option<f64>,
    pub feed_type: Option<String>,
    pub vaccination_count: Option<i64>,
    pub vaccine_name: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub weight: Option<f64>,
    pub health_status: Option<String>,
}

impl ResolvedMetrics {
    pub fn from_fields(fields: &FieldBag) -> Self {
        Self {
            mortality_count: FieldResolver::resolve_quantity(fields, Quantity::MortalityCount),
            death_cause: FieldResolver::resolve_quantity(fields, Quantity::DeathCause),
            feed_amount: FieldResolver::resolve_quantity(fields, Quantity::FeedAmount),
            feed_type: FieldResolver::resolve_quantity(fields, Quantity::FeedType),
            vaccination_count: FieldResolver::resolve_quantity(fields, Quantity::VaccinationCount),
            vaccine_name: FieldResolver::resolve_quantity(fields, Quantity::VaccineName),
            temperature: FieldResolver::resolve_quantity(fields, Quantity::Temperature),
            humidity: FieldResolver::resolve_quantity(fields, Quantity::Humidity),
            weight: FieldResolver::resolve_quantity(fields, Quantity::Weight),
            health_status: FieldResolver::resolve_quantity(fields, Quantity::HealthStatus),
        }
    }
}
