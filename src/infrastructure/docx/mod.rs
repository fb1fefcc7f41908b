//! 流式文档写出器（.docx）
//!
//! - `model`: 节 / 段落 / 列表 / 表格 / 页眉页脚，以及原样标记注入口
//! - `writer`: OOXML 打包
//! - `outline`: 读回结构，用于校验和诊断

pub mod model;
pub mod outline;
mod writer;

pub use model::{
    Align, BaseStyle, FlowDocument, HeaderFooter, ListHandle, ListKind, Paragraph, RawMarkup,
    Section,
};
pub use outline::{DocxOutline, SectionOutline};
