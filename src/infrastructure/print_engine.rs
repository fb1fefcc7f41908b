//! 打印引擎 - 基础设施层
//!
//! 分页打印引擎（无头 Chromium）被当作黑盒：输入 HTML 文件路径、
//! 输出 PDF 路径和页面选项，要么写出文件，要么报错。

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, Page};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser;
use crate::config::{Config, PageLayout};
use crate::error::{AppError, AppResult, BrowserError};

const MM_PER_INCH: f64 = 25.4;

/// 空的页眉 / 页脚模板，避免引擎打印默认的标题和 URL
pub const EMPTY_BAND: &str = "<span></span>";

/// 单次打印的页面选项
#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    pub layout: PageLayout,
    /// 每页重复的页眉 HTML
    pub header_html: Option<String>,
    /// 每页重复的页脚 HTML
    pub footer_html: Option<String>,
    /// 是否打印背景（水印层依赖它）
    pub print_background: bool,
}

impl PrintOptions {
    pub fn displays_bands(&self) -> bool {
        self.header_html.is_some() || self.footer_html.is_some()
    }
}

/// 一次打印任务
#[derive(Debug, Clone)]
pub struct PrintJob {
    /// 日志和错误里使用的阶段名（body / footer）
    pub stage: &'static str,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub options: PrintOptions,
}

/// 分页打印引擎
///
/// 职责：
/// - 把 `input_path` 的 HTML 打印成 PDF 写到 `output_path`
/// - 页眉页脚只有"所有页相同"这一种放置方式
/// - 不认识正文结构，不处理页面重组
pub trait PrintEngine: Send + Sync + 'static {
    fn print(&self, job: &PrintJob) -> impl Future<Output = AppResult<()>> + Send;
}

/// 可复用的长期资源：懒创建，坏掉后丢弃，下次使用时重建
struct ReusableSlot<T> {
    current: Mutex<Option<Arc<T>>>,
}

impl<T> ReusableSlot<T> {
    fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    async fn get_or_create<F, Fut>(&self, create: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut current = self.current.lock().await;
        if let Some(existing) = current.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let created = Arc::new(create().await?);
        *current = Some(Arc::clone(&created));
        Ok(created)
    }

    /// 丢弃 `stale`；槽里已经换成新实例时不动
    async fn discard(&self, stale: &Arc<T>) -> bool {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, stale)) {
            *current = None;
            return true;
        }
        false
    }
}

/// 可以异步关闭的页面
trait Closable: Send + 'static {
    fn close_quietly(self) -> impl Future<Output = ()> + Send + 'static;
}

impl Closable for Page {
    fn close_quietly(self) -> impl Future<Output = ()> + Send + 'static {
        async move {
            if let Err(e) = self.close().await {
                debug!("关闭页面失败: {}", e);
            }
        }
    }
}

/// 页面守卫
///
/// 打印可能被外层超时直接取消，取消时 `close` 不会执行，
/// 所以在 Drop 里补一个后台关闭，标签页不会留在共享浏览器里。
struct PageGuard<P: Closable> {
    page: Option<P>,
}

impl<P: Closable> PageGuard<P> {
    fn new(page: P) -> Self {
        Self { page: Some(page) }
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            page.close_quietly().await;
        }
    }
}

impl<P: Closable> Drop for PageGuard<P> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(page.close_quietly());
            }
        }
    }
}

/// 基于 Chromium 的打印引擎
///
/// 浏览器在第一次打印时才启动（或连接）。启动失败只影响当前请求；
/// 已启动的浏览器打不开新页面时被丢弃，下一次请求重新启动。
pub struct ChromePrintEngine {
    chrome_executable: Option<String>,
    debug_port: Option<u16>,
    /// 打开新页面的等待上限
    open_timeout: Duration,
    browser: ReusableSlot<Browser>,
}

impl ChromePrintEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            debug_port: config.browser_debug_port,
            open_timeout: config.render_timeout() / 2,
            browser: ReusableSlot::new(),
        }
    }

    /// 获取浏览器，必要时启动
    async fn browser(&self) -> AppResult<Arc<Browser>> {
        self.browser
            .get_or_create(move || async move {
                match self.debug_port {
                    Some(port) => browser::connect_to_browser(port).await,
                    None => browser::launch_headless_browser(self.chrome_executable.as_deref()).await,
                }
            })
            .await
            .map_err(AppError::engine_unavailable)
    }

    async fn discard(&self, stale: &Arc<Browser>) {
        if self.browser.discard(stale).await {
            warn!("⚠️ 浏览器无法打开新页面，已丢弃，下次请求重新启动");
        }
    }

    async fn open_page(&self, browser: &Arc<Browser>, url: &str) -> AppResult<Page> {
        let source: Box<dyn std::error::Error + Send + Sync> =
            match tokio::time::timeout(self.open_timeout, browser.new_page(url)).await {
                Ok(Ok(page)) => return Ok(page),
                Ok(Err(e)) => e.into(),
                Err(_) => format!("no response within {:?}", self.open_timeout).into(),
            };
        self.discard(browser).await;
        Err(BrowserError::PageCreationFailed { source }.into())
    }

    /// 预热：启动时尝试拉起浏览器，失败只记录警告
    pub async fn warmup(&self) {
        match self.browser().await {
            Ok(_) => info!("✓ 打印引擎已预热"),
            Err(e) => warn!("⚠️ 打印引擎预热失败，将在首次 PDF 请求时重试: {}", e),
        }
    }
}

impl PrintEngine for ChromePrintEngine {
    async fn print(&self, job: &PrintJob) -> AppResult<()> {
        let browser = self.browser().await?;
        let url = file_url(&job.input_path);
        debug!("[{}] 打印 {}", job.stage, url);

        let page = self.open_page(&browser, &url).await?;
        let guard = PageGuard::new(page.clone());

        let navigation = page.wait_for_navigation().await.map(|_| ());
        if let Err(e) = navigation {
            guard.close().await;
            return Err(BrowserError::NavigationFailed {
                url,
                source: Box::new(e),
            }
            .into());
        }

        let printed = page.pdf(to_print_params(&job.options)).await;
        guard.close().await;
        let bytes = printed.map_err(|e| BrowserError::PrintFailed { source: Box::new(e) })?;

        tokio::fs::write(&job.output_path, &bytes)
            .await
            .map_err(|e| AppError::file_write_failed(job.output_path.display().to_string(), e))?;
        debug!("[{}] 写出 {} 字节", job.stage, bytes.len());
        Ok(())
    }
}

fn to_print_params(options: &PrintOptions) -> PrintToPdfParams {
    let layout = &options.layout;
    let bands = options.displays_bands();
    PrintToPdfParams {
        display_header_footer: Some(bands),
        header_template: bands.then(|| {
            options.header_html.clone().unwrap_or_else(|| EMPTY_BAND.to_string())
        }),
        footer_template: bands.then(|| {
            options.footer_html.clone().unwrap_or_else(|| EMPTY_BAND.to_string())
        }),
        print_background: Some(options.print_background),
        paper_width: Some(layout.paper_width_mm / MM_PER_INCH),
        paper_height: Some(layout.paper_height_mm / MM_PER_INCH),
        margin_top: Some(layout.margin_top_mm / MM_PER_INCH),
        margin_right: Some(layout.margin_right_mm / MM_PER_INCH),
        margin_bottom: Some(layout.margin_bottom_mm / MM_PER_INCH),
        margin_left: Some(layout.margin_left_mm / MM_PER_INCH),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

/// 本地文件路径转 file:// URL
pub fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    if raw.starts_with('/') {
        format!("file://{}", raw)
    } else {
        format!("file:///{}", raw)
    }
}
