use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 纸张与页边距（单位：毫米）
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_right_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
}

impl Default for PageLayout {
    /// A4，上下 25mm、左右 15mm
    fn default() -> Self {
        Self {
            paper_width_mm: 210.0,
            paper_height_mm: 297.0,
            margin_top_mm: 25.0,
            margin_right_mm: 15.0,
            margin_bottom_mm: 25.0,
            margin_left_mm: 15.0,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 健康检查返回的服务名
    pub service_name: String,
    /// Chromium 可执行文件路径（为空则自动探测）
    pub chrome_executable: Option<String>,
    /// 已启动浏览器的调试端口（设置后连接而不是启动）
    pub browser_debug_port: Option<u16>,
    /// 单次打印的超时时间（秒）
    pub render_timeout_secs: u64,
    /// 临时文件删除前的宽限期（秒）
    pub cleanup_grace_secs: u64,
    /// 清理任务的扫描间隔（秒）
    pub cleanup_interval_secs: u64,
    /// 临时文件目录（为空则使用系统临时目录）
    pub temp_dir: Option<PathBuf>,
    /// PDF 页面布局
    pub page_layout: PageLayout,
    /// DOCX 基础字体
    pub docx_font_family: String,
    /// DOCX 基础字号（磅）
    pub docx_font_size_pt: u32,
    /// 请求体上限（字节）
    pub max_body_bytes: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            service_name: "Document Generation Service".to_string(),
            chrome_executable: None,
            browser_debug_port: None,
            render_timeout_secs: 60,
            cleanup_grace_secs: 10,
            cleanup_interval_secs: 5,
            temp_dir: None,
            page_layout: PageLayout::default(),
            docx_font_family: "Arial".to_string(),
            docx_font_size_pt: 11,
            max_body_bytes: 16 * 1024 * 1024,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：`DOCGEN_CONFIG` 指向的 TOML 文件（如果有），再叠加环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("DOCGEN_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 仅从环境变量加载（未设置或无法解析的变量取默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        toml::from_str(&content).map_err(|e| {
            AppError::File(crate::error::FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            host: std::env::var("HOST").unwrap_or(default.host),
            port: env_parse("PORT").unwrap_or(default.port),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(default.service_name),
            chrome_executable: std::env::var("CHROME_PATH").ok().or(default.chrome_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(default.browser_debug_port),
            render_timeout_secs: env_parse("RENDER_TIMEOUT_SECS").unwrap_or(default.render_timeout_secs),
            cleanup_grace_secs: env_parse("CLEANUP_GRACE_SECS").unwrap_or(default.cleanup_grace_secs),
            cleanup_interval_secs: env_parse("CLEANUP_INTERVAL_SECS").unwrap_or(default.cleanup_interval_secs),
            temp_dir: std::env::var("DOCGEN_TEMP_DIR").ok().map(PathBuf::from).or(default.temp_dir),
            page_layout: default.page_layout,
            docx_font_family: std::env::var("DOCX_FONT_FAMILY").unwrap_or(default.docx_font_family),
            docx_font_size_pt: env_parse("DOCX_FONT_SIZE_PT").unwrap_or(default.docx_font_size_pt),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(default.max_body_bytes),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.render_timeout_secs == 0 {
            return Err(invalid("render_timeout_secs", "must be greater than 0"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(invalid("cleanup_interval_secs", "must be greater than 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(invalid("max_body_bytes", "must be greater than 0"));
        }
        if self.docx_font_size_pt == 0 {
            return Err(invalid("docx_font_size_pt", "must be greater than 0"));
        }
        let layout = &self.page_layout;
        if layout.margin_top_mm + layout.margin_bottom_mm >= layout.paper_height_mm
            || layout.margin_left_mm + layout.margin_right_mm >= layout.paper_width_mm
        {
            return Err(invalid("page_layout", "margins leave no printable area"));
        }
        Ok(())
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_secs(self.cleanup_grace_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// 临时文件目录
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn invalid(field: &str, message: &str) -> AppError {
    AppError::Config(crate::error::ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    })
}
