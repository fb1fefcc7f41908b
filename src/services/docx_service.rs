//! DOCX 装配 - 业务能力层
//!
//! 页脚只出现在最后一页的做法：正文之后追加一个连续型分节，
//! 所有节的页眉页脚断开链接，只有最后一节的页脚有内容。
//! 水印没有原生支持，用页眉里的大号浅灰粗体段落近似。

use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use tracing::debug;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::docx::{
    Align, BaseStyle, FlowDocument, ListKind, Paragraph, RawMarkup,
};
use crate::models::{DocumentInput, ParsedElement};

/// 水印段落：72pt、粗体、C8C8C8、居中
pub fn watermark_markup(text: &str) -> RawMarkup {
    RawMarkup::new(format!(
        "<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:rPr><w:b/>\
         <w:color w:val=\"C8C8C8\"/><w:sz w:val=\"144\"/></w:rPr>\
         <w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape(text)
    ))
}

pub struct DocxAssembler {
    style: BaseStyle,
}

impl DocxAssembler {
    pub fn new(config: &Config) -> Self {
        Self {
            style: BaseStyle {
                font_family: config.docx_font_family.clone(),
                font_size_pt: config.docx_font_size_pt,
            },
        }
    }

    /// 构建文档模型（不落盘）
    pub fn build(&self, input: &DocumentInput) -> FlowDocument {
        let mut doc = FlowDocument::new(self.style.clone());

        for element in &input.body.elements {
            match element {
                ParsedElement::Heading { level, text } => {
                    let heading = doc.append_heading(text.as_str(), *level);
                    if *level == 1 {
                        heading.set_align(Align::Center);
                    }
                }
                ParsedElement::Paragraph {
                    text,
                    page_break_before,
                } => {
                    let paragraph = doc.append_paragraph(text.as_str());
                    if *page_break_before {
                        paragraph.set_page_break_before();
                    }
                }
                ParsedElement::List { ordered, items } => {
                    let kind = if *ordered { ListKind::Number } else { ListKind::Bullet };
                    let list = doc.begin_list(kind);
                    for item in items {
                        doc.append_list_item(&list, item.as_str());
                    }
                }
                ParsedElement::Table { rows } => doc.append_table(rows),
            }
        }

        let header = input.header.as_ref().filter(|band| band.has_text());
        let footer = input.footer.as_ref().filter(|band| band.has_text());

        if footer.is_some() {
            doc.add_section();
        }

        let decorated = header.is_some() || footer.is_some() || input.watermark.is_some();
        if !decorated {
            return doc;
        }

        let watermark = input.watermark.as_ref().map(|spec| spec.for_docx());
        let last = doc.sections().len() - 1;
        for (i, section) in doc.sections_mut().enumerate() {
            let header_band = section.header_mut();
            header_band.unlink().clear();
            if let Some(band) = header {
                header_band.push_paragraph(Paragraph::new(band.text.as_str()).with_align(Align::Center));
            }
            if let Some(text) = &watermark {
                header_band.inject_raw(watermark_markup(text));
            }

            let footer_band = section.footer_mut();
            footer_band.unlink().clear();
            if let (Some(band), true) = (footer, i == last) {
                footer_band.push_paragraph(
                    Paragraph::new(band.text.as_str())
                        .with_align(Align::Center)
                        .with_border_top(),
                );
            }
        }
        doc
    }

    /// 生成 DOCX 到 `output`（同步，调用方负责放到阻塞线程池）
    pub fn assemble(&self, input: &DocumentInput, output: &Path) -> AppResult<PathBuf> {
        let doc = self.build(input);
        debug!("DOCX 共 {} 节", doc.sections().len());
        doc.save(output)?;
        Ok(output.to_path_buf())
    }
}
