/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 生效的配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 {} 启动", config.service_name);
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 监听地址: {}", config.bind_address());
    info!("⏱️ 单次打印超时: {} 秒", config.render_timeout_secs);
    info!(
        "🗑️ 临时文件目录: {}（宽限期 {} 秒）",
        config.temp_dir().display(),
        config.cleanup_grace_secs
    );
    match (&config.chrome_executable, config.browser_debug_port) {
        (_, Some(port)) => info!("🧭 打印引擎: 连接已有浏览器（端口 {}）", port),
        (Some(path), None) => info!("🧭 打印引擎: {}", path),
        (None, None) => info!("🧭 打印引擎: 自动探测 Chromium"),
    }
    info!("{}", "=".repeat(60));
}

/// 记录程序退出信息
pub fn log_shutdown(pending_files: usize) {
    info!("\n{}", "─".repeat(60));
    info!("👋 服务停止，清理剩余临时文件 {} 个", pending_files);
    info!(
        "停止时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
