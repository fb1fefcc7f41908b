//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅者
///
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 为真时 `debug`。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
