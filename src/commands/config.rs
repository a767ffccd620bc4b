// 配置命令

use crate::config::{self, AppConfig};
use crate::detection::classifier::LandmarkThreshold;
use crate::error::AppResult;
use tracing::info;

/// 获取当前配置（格式化 JSON）
pub fn show_config() -> AppResult<String> {
    Ok(serde_json::to_string_pretty(&config::get_config())?)
}

/// 更新关键点阈值，负数被拒绝且不写入配置文件
pub fn set_threshold(threshold: i64) -> AppResult<AppConfig> {
    let validated = LandmarkThreshold::try_from(threshold)?;

    let mut new_config = config::get_config();
    new_config.classifier.threshold = validated.get() as i64;
    config::update_config(new_config.clone())?;

    info!("[CONFIG] 关键点阈值已更新: {}", validated.get());
    Ok(new_config)
}

/// 重置为默认配置
pub fn reset_config() -> AppResult<AppConfig> {
    let defaults = AppConfig::default();
    config::update_config(defaults.clone())?;
    info!("[CONFIG] 配置已重置");
    Ok(defaults)
}
