// 帧分类模块
//
// 关键点数量 >= 阈值即判定为 Human。阈值是策略常量，调用方可覆盖，默认 15。

use crate::error::{AppError, AppResult};
use crate::utils::{ClassificationLabel, LandmarkSet};

/// 默认关键点阈值
pub const DEFAULT_LANDMARK_THRESHOLD: usize = 15;

/// 已校验的关键点阈值（非负）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LandmarkThreshold(usize);

impl LandmarkThreshold {
    pub const fn new(count: usize) -> Self {
        Self(count)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for LandmarkThreshold {
    fn default() -> Self {
        Self(DEFAULT_LANDMARK_THRESHOLD)
    }
}

impl TryFrom<i64> for LandmarkThreshold {
    type Error = AppError;

    fn try_from(value: i64) -> AppResult<Self> {
        usize::try_from(value)
            .map(Self)
            .map_err(|_| AppError::Config(format!("关键点阈值必须为非负整数，当前值: {}", value)))
    }
}

/// 帧分类器
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClassifier {
    threshold: LandmarkThreshold,
}

impl FrameClassifier {
    pub fn new(threshold: LandmarkThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> LandmarkThreshold {
        self.threshold
    }

    pub fn classify(&self, landmarks: &LandmarkSet) -> ClassificationLabel {
        classify(landmarks, self.threshold)
    }
}

/// 按关键点数量分类，边界值（等于阈值）判定为 Human
pub fn classify(landmarks: &LandmarkSet, threshold: LandmarkThreshold) -> ClassificationLabel {
    if landmarks.len() >= threshold.get() {
        ClassificationLabel::Human
    } else {
        ClassificationLabel::NonHuman
    }
}
