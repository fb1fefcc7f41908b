//! 文档生成流程 - 流程层
//!
//! 核心职责：定义"一个请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 分配临时输出路径
//! 2. 门面生成文档
//! 3. 读回字节，登记延迟删除
//! 4. 失败时立即删除半成品

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConversionError};
use crate::infrastructure::{PrintEngine, TempFileRegistry};
use crate::models::{GeneratedFile, GenerationRequest};
use crate::services::DocumentService;
use crate::utils::logging::truncate_text;
use crate::workflow::request_ctx::RequestCtx;

/// 文档生成流程
///
/// - 不持有浏览器，只依赖业务能力（services）
/// - 临时文件交给注入的 `TempFileRegistry`
pub struct GenerateFlow<E: PrintEngine> {
    service: DocumentService<E>,
    registry: Arc<TempFileRegistry>,
    temp_dir: PathBuf,
    verbose_logging: bool,
}

impl<E: PrintEngine> GenerateFlow<E> {
    pub fn new(engine: Arc<E>, registry: Arc<TempFileRegistry>, config: &Config) -> Self {
        Self {
            service: DocumentService::new(engine, config),
            registry,
            temp_dir: config.temp_dir(),
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> AppResult<GeneratedFile> {
        let ctx = RequestCtx::new(request.document_type);
        info!("{} 📥 开始生成", ctx);
        if self.verbose_logging {
            debug!("{} 正文: {}", ctx, truncate_text(&request.content_html, 120));
        }

        let output = self.temp_dir.join(ctx.output_file_name());
        match self.produce(request, &output).await {
            Ok(bytes) => {
                self.registry.mark_for_cleanup(&output);
                info!(
                    "{} ✅ 完成，{} 字节，耗时 {} ms",
                    ctx,
                    bytes.len(),
                    ctx.elapsed_ms()
                );
                Ok(GeneratedFile {
                    bytes,
                    mime_type: request.document_type.mime_type(),
                    file_name: request.document_type.download_name(),
                })
            }
            Err(e) => {
                error!("{} ❌ 生成失败: {}", ctx, e);
                if let Err(cleanup) = tokio::fs::remove_file(&output).await {
                    debug!("{} 删除半成品失败（可能未生成）: {}", ctx, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn produce(&self, request: &GenerationRequest, output: &Path) -> AppResult<Vec<u8>> {
        let path = self.service.generate(request, output).await?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        if bytes.is_empty() {
            return Err(ConversionError::EmptyOutput { stage: "output" }.into());
        }
        Ok(bytes)
    }
}
