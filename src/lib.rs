// gaitgate - 基于姿态关键点的视频人物识别
// 库入口

pub mod commands;
pub mod config;
pub mod detection;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod utils;
pub mod video;

pub use detection::classifier::{classify, FrameClassifier, LandmarkThreshold, DEFAULT_LANDMARK_THRESHOLD};
pub use detection::detector::PoseDetector;
pub use error::{AppError, AppResult};
pub use metrics::{Clock, ManualClock, StreamMetrics, SystemClock};
pub use pipeline::{run, PipelineConfig, RunState, VideoClassificationPipeline};
pub use utils::{ClassificationLabel, Frame, FrameOutcome, Landmark, LandmarkSet, RunSummary};
pub use video::source::FrameSource;
