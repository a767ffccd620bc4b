// 错误处理模块
//
// 运行级错误（源故障、配置错误、取消）都会终止本次运行，并以可区分的变体返回给调用方，
// 调用方不会把失败的运行误认为准确率为 0% 的成功运行。
// 单帧未检测到姿态不属于错误，按正常规则归类为 NonHuman。

use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("帧源故障 (第 {frame_index} 帧): {message}")]
    SourceFailure { frame_index: u64, message: String },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("任务已取消 (已处理 {processed_frames} 帧)")]
    Cancelled { processed_frames: u64 },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("工作线程错误: {0}")]
    Worker(String),

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

impl AppError {
    pub fn source_failure(frame_index: u64, message: impl Into<String>) -> Self {
        Self::SourceFailure {
            frame_index,
            message: message.into(),
        }
    }

    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::SourceFailure { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// 以字符串形式序列化，便于写入运行报告或日志
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let failure = AppError::source_failure(5, "设备断开");
        assert!(failure.is_source_failure());
        assert!(!failure.is_cancelled());

        let cancelled = AppError::Cancelled { processed_frames: 3 };
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_source_failure());

        assert!(AppError::Config("阈值为负".into()).is_config());
    }

    #[test]
    fn test_serialize_as_message() {
        let err = AppError::Cancelled { processed_frames: 3 };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"任务已取消 (已处理 3 帧)\"");
    }
}
