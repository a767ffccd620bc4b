// 流水线模块
//
// 子模块：
// - runner: 逐帧检测、分类与统计的流水线及其状态机
// - worker: 在后台线程执行运行，逐帧结果经通道推送给展示层
// - cancel: 按运行 ID 管理的协作式取消标志

pub mod cancel;
pub mod runner;
pub mod worker;

pub use runner::{run, PipelineConfig, RunState, VideoClassificationPipeline};
pub use worker::{spawn_run, RunHandle};
