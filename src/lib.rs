//! # Docgen Service
//!
//! 把 HTML 片段（正文、页眉、页脚、水印）转换成可下载的 PDF 或 DOCX 的 HTTP 服务
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动或连接无头 Chromium
//! - `infrastructure/print_engine` - 分页打印引擎（HTML → PDF），页眉页脚只能每页相同
//! - `infrastructure/pdf_compose` - PDF 页数读取与页面叠加
//! - `infrastructure/docx` - 流式文档模型与 .docx 写出 / 读回
//! - `infrastructure/temp_files` - 临时文件延迟删除
//!
//! ### ② 业务能力层（Services）
//! - `html_parser` - HTML 片段解析（白名单块级元素）
//! - `PdfAssembler` - 页眉 / 水印每页，页脚仅最后一页（两次打印 + 叠加）
//! - `DocxAssembler` - 分节控制页脚范围，页眉写入水印
//! - `DocumentService` - 按类型分派的门面
//!
//! ### ③ 流程层（Workflow）
//! - `RequestCtx` - 请求上下文（编号 + 类型），用作日志前缀
//! - `GenerateFlow` - 单个请求的完整流程（生成 → 读回 → 登记清理）
//!
//! ### ④ 接口层 / 编排层
//! - `api/` - axum 路由、请求校验、响应映射
//! - `orchestrator/` - 应用生命周期
//!
//! ## 模块结构

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromePrintEngine, PrintEngine, TempFileRegistry};
pub use models::{DocumentType, GeneratedFile, GenerationRequest};
pub use orchestrator::App;
pub use services::DocumentService;
pub use workflow::{GenerateFlow, RequestCtx};
