use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求校验错误（返回 400）
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// 文档转换错误
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// 浏览器相关错误
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error(transparent)]
    File(#[from] FileError),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// 对应的 HTTP 状态码：请求体超限 413，其他校验错误 400，其余一律 500
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(ValidationError::PayloadTooLarge { .. }) => 413,
            AppError::Validation(_) => 400,
            _ => 500,
        }
    }
}

/// 请求校验错误
///
/// 文案是对外契约，调用方会按子串匹配，不要随意修改
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 缺少必填字段
    #[error("Missing required field: {field}")]
    MissingField { field: String },
    /// document_type 取值非法
    #[error("Invalid document_type: {value}. Must be one of ['pdf', 'docx']")]
    InvalidDocumentType { value: String },
    /// HTML 字段不是字符串
    #[error("Field {field} must be a string")]
    NotAString { field: String },
    /// 水印不是字符串
    #[error("Watermark must be a string")]
    InvalidWatermark,
    /// 请求体不是 JSON 对象
    #[error("Invalid JSON body: {detail}")]
    InvalidJson { detail: String },
    /// 请求体超过上限
    #[error("Request body too large (limit: {limit} bytes)")]
    PayloadTooLarge { limit: usize },
    /// 门面层兜底：不支持的文档类型
    #[error("Unsupported document type: {value}")]
    UnsupportedDocumentType { value: String },
}

/// 文档转换错误
#[derive(Debug, Error)]
pub enum ConversionError {
    /// 打印引擎不可用（浏览器缺失 / 启动失败）
    #[error("print engine unavailable: {source}")]
    EngineUnavailable { source: BoxError },
    /// 打印引擎渲染失败
    #[error("render failed ({stage}): {source}")]
    RenderFailed {
        stage: &'static str,
        source: BoxError,
    },
    /// 渲染超时
    #[error("render timed out after {secs}s ({stage})")]
    Timeout { stage: &'static str, secs: u64 },
    /// PDF 页面重组失败
    #[error("pdf composition failed: {source}")]
    PdfCompose {
        #[from]
        source: lopdf::Error,
    },
    /// 打印结果为空
    #[error("rendered pdf has no pages ({stage})")]
    EmptyOutput { stage: &'static str },
    /// DOCX 写出失败
    #[error("docx write failed: {source}")]
    DocxWrite { source: BoxError },
    /// 后台任务异常退出
    #[error("generation task aborted: {0}")]
    TaskAborted(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("failed to launch browser: {source}")]
    LaunchFailed { source: BoxError },
    /// 连接浏览器失败
    #[error("failed to connect to browser (port {port}): {source}")]
    ConnectionFailed { port: u16, source: BoxError },
    /// 浏览器配置失败
    #[error("invalid browser configuration: {message}")]
    ConfigurationFailed { message: String },
    /// 创建页面失败
    #[error("failed to open page: {source}")]
    PageCreationFailed { source: BoxError },
    /// 导航失败
    #[error("failed to load {url}: {source}")]
    NavigationFailed { url: String, source: BoxError },
    /// 打印失败
    #[error("print to pdf failed: {source}")]
    PrintFailed { source: BoxError },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: String, source: BoxError },
    /// 写入文件失败
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: String, source: BoxError },
    /// 创建临时文件失败
    #[error("failed to create temporary file: {source}")]
    TempFileFailed { source: BoxError },
    /// 其他 IO 错误
    #[error("file operation failed: {source}")]
    Io { source: std::io::Error },
    /// TOML 解析失败
    #[error("failed to parse TOML {path}: {source}")]
    TomlParseFailed { path: String, source: BoxError },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值非法
    #[error("invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(ValidationError::InvalidJson {
            detail: err.to_string(),
        })
    }
}

/// 不知道路径和方向的 IO 错误；已知路径时用 `file_read_failed` / `file_write_failed`
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io { source: err })
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::Conversion(ConversionError::PdfCompose { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建临时文件错误
    pub fn temp_file_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File(FileError::TempFileFailed {
            source: Box::new(source),
        })
    }

    /// 创建渲染失败错误
    pub fn render_failed(
        stage: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        AppError::Conversion(ConversionError::RenderFailed {
            stage,
            source: source.into(),
        })
    }

    /// 创建 DOCX 写出错误
    pub fn docx_write_failed(source: impl Into<BoxError>) -> Self {
        AppError::Conversion(ConversionError::DocxWrite {
            source: source.into(),
        })
    }

    /// 创建打印引擎不可用错误
    pub fn engine_unavailable(source: impl Into<AppError>) -> Self {
        AppError::Conversion(ConversionError::EngineUnavailable {
            source: Box::new(source.into()),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err: AppError = ValidationError::MissingField {
            field: "content_html".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Missing required field: content_html");
    }

    #[test]
    fn test_oversized_body_maps_to_413() {
        let err: AppError = ValidationError::PayloadTooLarge { limit: 1024 }.into();
        assert_eq!(err.status_code(), 413);
    }

    #[test]
    fn test_conversion_maps_to_500() {
        let err: AppError = ConversionError::Timeout {
            stage: "body",
            secs: 60,
        }
        .into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("60s"));
    }

    #[test]
    fn test_invalid_document_type_message_names_value() {
        let err = ValidationError::InvalidDocumentType {
            value: "xml".to_string(),
        };
        assert!(err.to_string().contains("Invalid document_type: xml"));
    }

    #[test]
    fn test_bare_io_error_is_not_reported_as_read() {
        let err: AppError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, AppError::File(FileError::Io { .. })));
        assert_eq!(err.to_string(), "file operation failed: denied");
        assert_eq!(err.status_code(), 500);
    }
}
