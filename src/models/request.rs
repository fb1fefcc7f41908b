use std::fmt::Display;

use crate::error::ValidationError;
use crate::models::element::{HtmlFragment, ParsedFragment};
use crate::models::watermark::WatermarkSpec;
use crate::services::html_parser;

/// 输出文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// 不区分大小写解析
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentType::Pdf),
            "docx" => Ok(DocumentType::Docx),
            _ => Err(ValidationError::UnsupportedDocumentType {
                value: value.to_string(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "application/pdf",
            DocumentType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// 下载文件名
    pub fn download_name(&self) -> String {
        format!("document.{}", self.extension())
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// 文档生成请求（已通过校验）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub content_html: String,
    pub header_html: Option<String>,
    pub footer_html: Option<String>,
    pub document_type: DocumentType,
    pub watermark: Option<String>,
}

impl GenerationRequest {
    pub fn new(content_html: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            content_html: content_html.into(),
            header_html: None,
            footer_html: None,
            document_type,
            watermark: None,
        }
    }

    pub fn with_header(mut self, html: impl Into<String>) -> Self {
        self.header_html = Some(html.into());
        self
    }

    pub fn with_footer(mut self, html: impl Into<String>) -> Self {
        self.footer_html = Some(html.into());
        self
    }

    pub fn with_watermark(mut self, watermark: impl Into<String>) -> Self {
        self.watermark = Some(watermark.into());
        self
    }

    /// 解析为两个装配器共用的输入
    pub fn to_input(&self) -> DocumentInput {
        DocumentInput {
            body: html_parser::parse_fragment(&self.content_html),
            header: self.header_html.as_deref().and_then(html_parser::parse_band),
            footer: self.footer_html.as_deref().and_then(html_parser::parse_band),
            watermark: self.watermark.as_deref().and_then(WatermarkSpec::from_input),
        }
    }
}

/// 装配器的统一输入
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub body: ParsedFragment,
    pub header: Option<HtmlFragment>,
    pub footer: Option<HtmlFragment>,
    pub watermark: Option<WatermarkSpec>,
}

/// 生成结果（返回给调用方的文件）
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}
