// 配置管理模块

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use crate::detection::classifier::{LandmarkThreshold, DEFAULT_LANDMARK_THRESHOLD};
use crate::error::{AppError, AppResult};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{info, warn};

static CONFIG: OnceCell<RwLock<AppConfig>> = OnceCell::new();
static CONFIG_PATH: OnceCell<std::path::PathBuf> = OnceCell::new();

/// 日志级别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 转换为 tracing 过滤器字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 分类配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    /// 判定为 Human 所需的最少关键点数；负数在运行开始前被拒绝
    pub threshold: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LANDMARK_THRESHOLD as i64,
        }
    }
}

impl ClassifierConfig {
    pub fn validated_threshold(&self) -> AppResult<LandmarkThreshold> {
        LandmarkThreshold::try_from(self.threshold)
    }
}

/// 姿态检测器参数
///
/// 原样转交给检测器，流水线本身不解释这些值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseDetectorConfig {
    /// 静态图片模式（每帧独立检测，不做跟踪）
    pub static_image_mode: bool,
    /// 模型复杂度 (0 / 1 / 2)
    pub model_complexity: u8,
    pub enable_segmentation: bool,
    /// 跨帧平滑关键点
    pub smooth_landmarks: bool,
    /// 检测置信度阈值 (0.0 - 1.0)
    pub min_detection_confidence: f32,
    /// 跟踪置信度阈值 (0.0 - 1.0)
    pub min_tracking_confidence: f32,
}

impl Default for PoseDetectorConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            model_complexity: 1,
            enable_segmentation: false,
            smooth_landmarks: true,
            min_detection_confidence: 0.9,
            min_tracking_confidence: 0.9,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// 分类配置
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// 检测器配置
    #[serde(default)]
    pub detector: PoseDetectorConfig,
    /// 日志级别
    #[serde(default)]
    pub log_level: LogLevel,
}

/// 读取配置文件，不存在时写入默认配置
///
/// JSON 解析失败时使用默认配置，不覆盖原文件。
pub fn load_config_file(config_path: &Path) -> AppResult<AppConfig> {
    if config_path.exists() {
        let content = fs::read_to_string(config_path)?;
        Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("[CONFIG] 配置文件 JSON 解析失败: {}，使用默认配置", e);
            AppConfig::default()
        }))
    } else {
        let config = AppConfig::default();
        save_config_file(config_path, &config)?;
        info!("[CONFIG] 已创建默认配置: {}", config_path.display());
        Ok(config)
    }
}

/// 写入配置文件（格式化 JSON）
pub fn save_config_file(config_path: &Path, config: &AppConfig) -> AppResult<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(config_path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

/// 初始化配置
pub fn init_config(config_path: &Path) -> AppResult<()> {
    CONFIG_PATH.set(config_path.to_path_buf())
        .map_err(|_| AppError::Config("配置路径已初始化".to_string()))?;

    let config = load_config_file(config_path)?;

    info!("[CONFIG] 配置已加载: 阈值={}, 日志级别={}",
        config.classifier.threshold, config.log_level.as_str());

    CONFIG.set(RwLock::new(config))
        .map_err(|_| AppError::Config("配置已初始化".to_string()))?;

    Ok(())
}

/// 获取配置
pub fn get_config() -> AppConfig {
    CONFIG.get()
        .map(|c| c.read().clone())
        .unwrap_or_default()
}

/// 更新配置
pub fn update_config(config: AppConfig) -> AppResult<()> {
    info!("[CONFIG] 配置更新");

    // 先写文件，成功后再更新内存
    if let Some(path) = CONFIG_PATH.get() {
        save_config_file(path, &config)?;
    }

    if let Some(lock) = CONFIG.get() {
        let mut current = lock.write();
        *current = config;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_detector_settings() {
        let config = AppConfig::default();
        assert_eq!(config.classifier.threshold, 15);
        assert!(!config.detector.static_image_mode);
        assert!(config.detector.smooth_landmarks);
        assert_eq!(config.detector.model_complexity, 1);
        assert!((config.detector.min_detection_confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = load_config_file(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = load_config_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "classifier": { "threshold": 20 }, "log_level": "debug" }"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.classifier.threshold, 20);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.detector, PoseDetectorConfig::default());
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        // 原文件保持不变
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        load_config_file(&path).unwrap();

        let mut config = AppConfig::default();
        config.classifier.threshold = 4;
        config.detector.model_complexity = 2;
        config.log_level = LogLevel::Warn;
        save_config_file(&path, &config).unwrap();

        assert_eq!(load_config_file(&path).unwrap(), config);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = ClassifierConfig { threshold: -1 };
        let err = config.validated_threshold().unwrap_err();
        assert!(err.is_config());

        let ok = ClassifierConfig { threshold: 0 }.validated_threshold().unwrap();
        assert_eq!(ok.get(), 0);
    }
}
