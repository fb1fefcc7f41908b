//! PDF 装配 - 业务能力层
//!
//! 页眉、水印交给打印引擎（每页重复）；页脚只在最后一页，
//! 打印引擎做不到，所以分两次打印再在 PDF 层面叠加：
//!
//! 1. 正文 + 页眉 + 水印 → body.pdf
//! 2. 空白正文 + 页脚 → footer.pdf（单页）
//! 3. footer.pdf 第一页叠加到 body.pdf 最后一页

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use quick_xml::escape::escape;
use tracing::{debug, info};

use crate::config::{Config, PageLayout};
use crate::error::{AppError, AppResult, ConversionError};
use crate::infrastructure::pdf_compose;
use crate::infrastructure::{PrintEngine, PrintJob, PrintOptions};
use crate::models::{DocumentInput, HtmlFragment, ParsedElement, ParsedFragment, WatermarkSpec};

/// 页脚单独打印时使用的空白正文
const BLANK_BODY: &str = "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body></body></html>";

const BODY_STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif;
            margin: 0;
            padding: 20px;
            position: relative;
            z-index: 1;
        }
        #content {
            position: relative;
            z-index: 10;
        }
        table { border-collapse: collapse; }
        th, td { border: 1px solid #000; padding: 4px 8px; }
"#;

const WATERMARK_STYLE: &str = r#"
        .watermark-container {
            position: fixed;
            top: 0;
            left: 0;
            width: 100%;
            height: 100%;
            z-index: -1000;
            pointer-events: none;
        }
        .watermark {
            position: absolute;
            top: 50%;
            left: 50%;
            transform: translate(-50%, -50%) rotate(-45deg);
            font-size: 120px;
            color: rgba(200, 200, 200, 0.3);
            white-space: nowrap;
            z-index: -1000;
        }
"#;

/// 把解析结果渲染回语义化 HTML
///
/// 没有任何白名单元素但有文本时，退化为一个段落
pub fn render_body_html(fragment: &ParsedFragment) -> String {
    let mut html = String::new();
    if fragment.is_empty() {
        if !fragment.text.is_empty() {
            let _ = write!(html, "<p>{}</p>", escape(fragment.text.as_str()));
        }
        return html;
    }

    for element in &fragment.elements {
        match element {
            ParsedElement::Heading { level, text } => {
                let _ = write!(html, "<h{0}>{1}</h{0}>", level, escape(text.as_str()));
            }
            ParsedElement::Paragraph {
                text,
                page_break_before,
            } => {
                if *page_break_before {
                    let _ = write!(
                        html,
                        "<p style=\"page-break-before: always\">{}</p>",
                        escape(text.as_str())
                    );
                } else {
                    let _ = write!(html, "<p>{}</p>", escape(text.as_str()));
                }
            }
            ParsedElement::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                let _ = write!(html, "<{}>", tag);
                for item in items {
                    let _ = write!(html, "<li>{}</li>", escape(item.as_str()));
                }
                let _ = write!(html, "</{}>", tag);
            }
            ParsedElement::Table { rows } => {
                html.push_str("<table>");
                for row in rows {
                    html.push_str("<tr>");
                    for cell in row {
                        let _ = write!(html, "<td>{}</td>", escape(cell.as_str()));
                    }
                    html.push_str("</tr>");
                }
                html.push_str("</table>");
            }
        }
    }
    html
}

/// 正文打印用的完整 HTML 文档（内容容器 + 可选水印层）
pub fn compose_document_html(body: &ParsedFragment, watermark: Option<&WatermarkSpec>) -> String {
    let (watermark_style, watermark_layer) = match watermark {
        Some(spec) => (
            WATERMARK_STYLE,
            format!(
                "<div class=\"watermark-container\"><div class=\"watermark\">{}</div></div>",
                escape(spec.for_pdf())
            ),
        ),
        None => ("", String::new()),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Generated Document</title>\n\
         <style>{}{}</style>\n</head>\n<body>\n{}\n<div id=\"content\">{}</div>\n</body>\n</html>\n",
        watermark_style,
        BODY_STYLE,
        watermark_layer,
        render_body_html(body)
    )
}

/// 打印引擎的页眉模板：默认字号极小，需要显式设置
pub fn header_band(header: &HtmlFragment) -> String {
    band_template(&header.html)
}

/// 页脚模板（只用于单独的页脚打印）
pub fn footer_band(footer: &HtmlFragment) -> String {
    band_template(&footer.html)
}

fn band_template(html: &str) -> String {
    format!(
        "<div style=\"width: 100%; font-size: 10px; font-family: Arial, sans-serif; \
         text-align: center; -webkit-print-color-adjust: exact;\">{}</div>",
        html
    )
}

/// PDF 装配器
pub struct PdfAssembler<E: PrintEngine> {
    engine: Arc<E>,
    layout: PageLayout,
    timeout: Duration,
    temp_root: PathBuf,
}

impl<E: PrintEngine> PdfAssembler<E> {
    pub fn new(engine: Arc<E>, config: &Config) -> Self {
        Self {
            engine,
            layout: config.page_layout.clone(),
            timeout: config.render_timeout(),
            temp_root: config.temp_dir(),
        }
    }

    /// 生成 PDF 到 `output`
    ///
    /// 中间文件放在本次装配独占的临时目录里，结束时（无论成败）一起删除
    pub async fn assemble(&self, input: &DocumentInput, output: &Path) -> AppResult<PathBuf> {
        let workdir = tempfile::Builder::new()
            .prefix("docgen-pdf-")
            .tempdir_in(&self.temp_root)
            .map_err(AppError::temp_file_failed)?;

        let body_html = workdir.path().join("body.html");
        write_file(&body_html, &compose_document_html(&input.body, input.watermark.as_ref())).await?;

        let body_options = PrintOptions {
            layout: self.layout.clone(),
            header_html: input.header.as_ref().map(header_band),
            footer_html: None,
            print_background: true,
        };

        let Some(footer) = input.footer.as_ref() else {
            self.print(PrintJob {
                stage: "body",
                input_path: body_html,
                output_path: output.to_path_buf(),
                options: body_options,
            })
            .await?;
            info!("✅ PDF 生成完成（无页脚）");
            return Ok(output.to_path_buf());
        };

        let body_pdf = workdir.path().join("body.pdf");
        self.print(PrintJob {
            stage: "body",
            input_path: body_html,
            output_path: body_pdf.clone(),
            options: body_options,
        })
        .await?;

        let footer_html = workdir.path().join("footer.html");
        let footer_pdf = workdir.path().join("footer.pdf");
        write_file(&footer_html, BLANK_BODY).await?;
        self.print(PrintJob {
            stage: "footer",
            input_path: footer_html,
            output_path: footer_pdf.clone(),
            options: PrintOptions {
                layout: self.layout.clone(),
                header_html: None,
                footer_html: Some(footer_band(footer)),
                print_background: false,
            },
        })
        .await?;

        let out = output.to_path_buf();
        let summary = tokio::task::spawn_blocking(move || {
            pdf_compose::stamp_on_last_page(&body_pdf, &footer_pdf, &out)
        })
        .await
        .map_err(|e| ConversionError::TaskAborted(e.to_string()))??;

        info!(
            "✅ PDF 生成完成，共 {} 页，页脚位于第 {} 页",
            summary.page_count, summary.stamped_page
        );
        Ok(output.to_path_buf())
    }

    /// 单次打印，带超时
    async fn print(&self, job: PrintJob) -> AppResult<()> {
        debug!("[{}] 开始打印 → {}", job.stage, job.output_path.display());
        match tokio::time::timeout(self.timeout, self.engine.print(&job)).await {
            Ok(result) => result,
            Err(_) => Err(ConversionError::Timeout {
                stage: job.stage,
                secs: self.timeout.as_secs(),
            }
            .into()),
        }
    }
}

async fn write_file(path: &Path, content: &str) -> AppResult<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::html_parser;

    #[test]
    fn test_body_html_is_escaped_and_keeps_page_breaks() {
        let fragment = html_parser::parse_fragment(
            r#"<h1>A &amp; B</h1><p style="page-break-before: always">next</p><ol><li>x</li></ol>"#,
        );
        let html = render_body_html(&fragment);
        assert_eq!(
            html,
            "<h1>A &amp; B</h1><p style=\"page-break-before: always\">next</p><ol><li>x</li></ol>"
        );
    }

    #[test]
    fn test_plain_text_body_falls_back_to_paragraph() {
        let fragment = html_parser::parse_fragment("just <b>text</b>");
        assert_eq!(render_body_html(&fragment), "<p>just text</p>");
    }

    #[test]
    fn test_watermark_layer_only_when_set() {
        let body = html_parser::parse_fragment("<p>x</p>");
        let plain = compose_document_html(&body, None);
        assert!(!plain.contains("watermark"));
        assert!(plain.contains("<div id=\"content\"><p>x</p></div>"));

        let spec = WatermarkSpec::from_input("Draft <i>copy</i>").unwrap();
        let marked = compose_document_html(&body, Some(&spec));
        assert!(marked.contains("rotate(-45deg)"));
        assert!(marked.contains("<div class=\"watermark\">Draft copy</div>"));
    }

    #[test]
    fn test_band_templates_set_font_size() {
        let band = html_parser::parse_band("<b>Head</b>").unwrap();
        let header = header_band(&band);
        assert!(header.contains("font-size: 10px"));
        assert!(header.contains("<b>Head</b>"));
        assert_eq!(footer_band(&band), header);
    }
}
