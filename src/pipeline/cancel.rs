// 取消标志管理
//
// 按运行 ID 管理的取消标志，多个运行并存时互不干扰。
// 取消是协作式的：流水线在两帧之间轮询标志，不会打断正在处理的帧。

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

static CANCEL_FLAGS: Lazy<Mutex<HashMap<String, Arc<AtomicBool>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn lock_flags() -> MutexGuard<'static, HashMap<String, Arc<AtomicBool>>> {
    CANCEL_FLAGS.lock().unwrap_or_else(|poisoned| {
        warn!("[CANCEL] 取消标志 Mutex 被毒化，尝试恢复");
        poisoned.into_inner()
    })
}

/// RAII 守卫：作用域结束时清理运行的取消标志
pub struct CancelFlagGuard {
    run_id: String,
}

impl CancelFlagGuard {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self { run_id: run_id.into() }
    }
}

impl Drop for CancelFlagGuard {
    fn drop(&mut self) {
        remove_cancel_flag(&self.run_id);
    }
}

/// 重置运行的取消标志（开始新运行时调用）
pub fn reset_cancel_flag(run_id: &str) -> Arc<AtomicBool> {
    let mut flags = lock_flags();
    let flag = flags
        .entry(run_id.to_string())
        .or_insert_with(|| Arc::new(AtomicBool::new(false)));
    flag.store(false, Ordering::SeqCst);
    flag.clone()
}

/// 移除运行的取消标志
pub fn remove_cancel_flag(run_id: &str) {
    lock_flags().remove(run_id);
}

/// 请求取消运行，返回该运行是否仍在登记中
pub fn cancel_run(run_id: &str) -> bool {
    match lock_flags().get(run_id) {
        Some(flag) => {
            flag.store(true, Ordering::SeqCst);
            info!("[CANCEL] 已请求取消: run_id={}", run_id);
            true
        }
        None => false,
    }
}
