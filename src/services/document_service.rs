//! 文档门面 - 业务能力层
//!
//! 两个装配器共用同一份输入，这里只按类型分派

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::{AppResult, ConversionError};
use crate::infrastructure::PrintEngine;
use crate::models::{DocumentType, GenerationRequest};
use crate::services::docx_service::DocxAssembler;
use crate::services::pdf_service::PdfAssembler;

pub struct DocumentService<E: PrintEngine> {
    pdf: PdfAssembler<E>,
    docx: Arc<DocxAssembler>,
}

impl<E: PrintEngine> DocumentService<E> {
    pub fn new(engine: Arc<E>, config: &Config) -> Self {
        Self {
            pdf: PdfAssembler::new(engine, config),
            docx: Arc::new(DocxAssembler::new(config)),
        }
    }

    /// 生成文档到 `output`，返回输出路径
    pub async fn generate(&self, request: &GenerationRequest, output: &Path) -> AppResult<PathBuf> {
        let input = request.to_input();
        let (headings, paragraphs, list_items, tables) = input.body.counts();
        info!(
            "📄 生成 {}：标题 {} / 段落 {} / 列表项 {} / 表格 {}，页眉 {}，页脚 {}，水印 {}",
            request.document_type,
            headings,
            paragraphs,
            list_items,
            tables,
            input.header.is_some(),
            input.footer.is_some(),
            input.watermark.is_some(),
        );

        match request.document_type {
            DocumentType::Pdf => self.pdf.assemble(&input, output).await,
            DocumentType::Docx => {
                let docx = Arc::clone(&self.docx);
                let output = output.to_path_buf();
                tokio::task::spawn_blocking(move || docx.assemble(&input, &output))
                    .await
                    .map_err(|e| ConversionError::TaskAborted(e.to_string()))?
            }
        }
    }
}
