//! 临时文件延迟删除 - 基础设施层
//!
//! 打印进程可能还占着文件，所以登记后要等一个宽限期才真正删除；
//! 删除失败的保留在列表里下一轮重试。清理是尽力而为，从不影响请求结果。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

pub struct TempFileRegistry {
    grace: Duration,
    pending: Mutex<Vec<(PathBuf, Instant)>>,
}

impl TempFileRegistry {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(PathBuf, Instant)>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 登记待删除的文件（不存在的路径直接忽略）
    pub fn mark_for_cleanup(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if !path.exists() {
            return;
        }
        debug!("🗑️ 登记临时文件: {}", path.display());
        self.lock().push((path.to_path_buf(), Instant::now()));
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// 删除超过宽限期的文件，返回本轮删除的数量
    pub fn sweep(&self) -> usize {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|(path, marked_at)| {
            if marked_at.elapsed() < self.grace {
                return true;
            }
            match remove_if_exists(path) {
                Ok(()) => false,
                Err(e) => {
                    debug!("临时文件暂时无法删除，稍后重试 {}: {}", path.display(), e);
                    true
                }
            }
        });
        before - pending.len()
    }

    /// 退出前的最后一次清理，不看宽限期
    pub fn cleanup_all(&self) {
        let mut pending = self.lock();
        for (path, _) in pending.drain(..) {
            if let Err(e) = remove_if_exists(&path) {
                debug!("退出清理失败 {}: {}", path.display(), e);
            }
        }
    }

    /// 后台定期清理
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = registry.sweep();
                if removed > 0 {
                    debug!("清理了 {} 个临时文件", removed);
                }
            }
        })
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
