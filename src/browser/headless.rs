use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppResult, BrowserError};

/// 启动无头浏览器
///
/// `chrome_executable` 为空时由 chromiumoxide 自动探测 Chrome / Chromium
pub async fn launch_headless_browser(chrome_executable: Option<&str>) -> AppResult<Browser> {
    info!("🚀 启动无头浏览器...");
    debug!("浏览器路径: {:?}", chrome_executable);

    // 配置无头浏览器
    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",                  // 无头模式禁用 GPU
        "--no-sandbox",                   // 容器内运行没有沙盒权限
        "--disable-dev-shm-usage",        // 防止共享内存不足
        "--allow-file-access-from-files", // 打印的 HTML 来自本地临时文件
    ]);
    if let Some(path) = chrome_executable {
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        BrowserError::ConfigurationFailed { message: e }
    })?;

    // 启动浏览器
    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed { source: Box::new(e) }
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        super::drive_events(handler).await;
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    info!("✅ 无头浏览器已就绪");
    Ok(browser)
}
