// 后台运行
//
// 在独立线程中执行流水线，逐帧结果通过无界通道发送给展示层，
// 展示层处理慢不会阻塞流水线。同一时刻一个运行只对应一份统计状态。

use crate::detection::detector::PoseDetector;
use crate::error::{AppError, AppResult};
use crate::metrics::Clock;
use crate::pipeline::cancel::{cancel_run, reset_cancel_flag, CancelFlagGuard};
use crate::pipeline::runner::{PipelineConfig, VideoClassificationPipeline};
use crate::utils::{generate_id, FrameOutcome, RunSummary};
use crate::video::source::FrameSource;
use crossbeam_channel::Receiver;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// 后台运行句柄
pub struct RunHandle {
    run_id: String,
    outcomes: Receiver<FrameOutcome>,
    thread: JoinHandle<AppResult<RunSummary>>,
}

impl RunHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 逐帧结果；运行结束后通道关闭
    pub fn outcomes(&self) -> &Receiver<FrameOutcome> {
        &self.outcomes
    }

    /// 请求取消，流水线在处理完当前帧后停止；运行已结束时返回 false
    pub fn cancel(&self) -> bool {
        info!("[WORKER] 收到取消请求: run_id={}", self.run_id);
        cancel_run(&self.run_id)
    }

    /// 等待运行结束
    pub fn join(self) -> AppResult<RunSummary> {
        self.thread
            .join()
            .map_err(|_| AppError::Worker(format!("运行线程异常退出: run_id={}", self.run_id)))?
    }
}

/// 在后台线程启动一次运行
///
/// 取消标志登记在取消登记表中（按运行 ID），运行结束时自动移除。
/// stop_after 为 Some(n) 时，第 n 帧结果发出后在运行线程内请求取消，
/// 运行以 Cancelled { processed_frames: n } 结束。
pub fn spawn_run(
    config: PipelineConfig,
    clock: Box<dyn Clock>,
    mut source: Box<dyn FrameSource>,
    mut detector: Box<dyn PoseDetector>,
    stop_after: Option<u64>,
) -> AppResult<RunHandle> {
    let run_id = generate_id();
    // 守卫先于线程创建，spawn 失败时登记也会被清理
    let guard = CancelFlagGuard::new(run_id.clone());
    let cancel_flag = reset_cancel_flag(&run_id);
    let (tx, rx) = crossbeam_channel::unbounded();

    let mut pipeline = VideoClassificationPipeline::with_clock(config, clock)
        .with_run_id(run_id.clone())
        .with_cancel_flag(cancel_flag);

    let thread_run_id = run_id.clone();
    let thread = std::thread::Builder::new()
        .name(format!("gaitgate-run-{}", &run_id[..8.min(run_id.len())]))
        .spawn(move || {
            let _guard = guard;
            let mut emitted = 0u64;
            pipeline.run(source.as_mut(), detector.as_mut(), |outcome| {
                // 接收端已关闭时丢弃结果，运行继续
                if tx.send(outcome.clone()).is_err() {
                    debug!("[WORKER] 结果接收端已关闭");
                }
                emitted += 1;
                if stop_after == Some(emitted) {
                    info!("[WORKER] 已达到帧数上限 {}，请求取消", emitted);
                    cancel_run(&thread_run_id);
                }
            })
        })?;

    info!("[WORKER] 后台运行已启动: run_id={}", run_id);
    Ok(RunHandle {
        run_id,
        outcomes: rx,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::detector::ScriptedDetector;
    use crate::metrics::ManualClock;
    use crate::video::source::{frame_channel, MemorySource};
    use crate::utils::Frame;
    use std::time::{Duration, Instant};

    fn clock() -> Box<dyn Clock> {
        Box::new(ManualClock::new(Instant::now(), Duration::from_millis(100)))
    }

    #[test]
    fn test_background_run_streams_outcomes() {
        let handle = spawn_run(
            PipelineConfig::default(),
            clock(),
            Box::new(MemorySource::blank(6, 64, 48)),
            Box::new(ScriptedDetector::from_counts(vec![20, 20, 0, 0, 15, 14])),
            None,
        )
        .unwrap();

        let outcomes: Vec<FrameOutcome> = handle.outcomes().iter().collect();
        let summary = handle.join().unwrap();

        assert_eq!(outcomes.len(), 6);
        assert_eq!(summary.total_frames, 6);
        assert_eq!(summary.human_frames, 3);
        assert_eq!(summary.accuracy_pct, 50.0);
    }

    #[test]
    fn test_cancel_live_source() {
        let (tx, source) = frame_channel("live", 16);
        let handle = spawn_run(
            PipelineConfig::default(),
            clock(),
            Box::new(source),
            Box::new(ScriptedDetector::from_counts(vec![20; 100])),
            None,
        )
        .unwrap();

        tx.send(Ok(Frame::without_pixels(0, 64, 48))).unwrap();
        let first = handle.outcomes().recv().unwrap();
        assert_eq!(first.frame_index, 0);

        // 取消可能在第 0 帧之后或第 1 帧之后被观察到
        assert!(handle.cancel());
        let _ = tx.send(Ok(Frame::without_pixels(1, 64, 48)));

        match handle.join() {
            Err(AppError::Cancelled { processed_frames }) => {
                assert!((1..=2).contains(&processed_frames))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_stop_after_cancels_inside_worker() {
        let handle = spawn_run(
            PipelineConfig::default(),
            clock(),
            Box::new(MemorySource::blank(200, 64, 48)),
            Box::new(ScriptedDetector::from_counts(vec![20; 200])),
            Some(2),
        )
        .unwrap();

        let indices: Vec<u64> = handle.outcomes().iter().map(|o| o.frame_index).collect();
        assert!(matches!(handle.join(), Err(AppError::Cancelled { processed_frames: 2 })));
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_registration_removed_after_run() {
        let handle = spawn_run(
            PipelineConfig::default(),
            clock(),
            Box::new(MemorySource::blank(3, 64, 48)),
            Box::new(ScriptedDetector::default()),
            None,
        )
        .unwrap();
        let run_id = handle.run_id().to_string();

        assert_eq!(handle.join().unwrap().total_frames, 3);
        assert!(!cancel_run(&run_id));
    }
}
