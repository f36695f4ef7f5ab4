// ==========================================
// 家禽批次管理系统 - 统计配置读取 Trait
// ==========================================
// 职责: 定义统计重算所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::derivation::HealthThresholds;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// StatsConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait StatsConfigReader: Send + Sync {
    /// 获取健康状态阈值（死亡率 %）
    ///
    /// # 默认值
    /// - Poor > 5.0, Fair > 3.0, Good > 1.0
    ///
    /// # 说明
    /// 单项缺失或无法解析时回退该项默认值, 非严格递减时整体回退默认值
    async fn get_health_thresholds(&self) -> Result<HealthThresholds, Box<dyn Error + Send + Sync>>;
}

/// 固定返回默认阈值的读取器（无数据库场景）
pub struct DefaultStatsConfig;

#[async_trait]
impl StatsConfigReader for DefaultStatsConfig {
    async fn get_health_thresholds(&self) -> Result<HealthThresholds, Box<dyn Error + Send + Sync>> {
        Ok(HealthThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_default_reader_via_trait_object() {
        let reader: Arc<dyn StatsConfigReader> = Arc::new(DefaultStatsConfig);
        let thresholds = reader.get_health_thresholds().await.unwrap();
        assert_eq!(thresholds, HealthThresholds::default());
    }
}
