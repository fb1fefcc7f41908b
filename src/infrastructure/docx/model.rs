//! 流式文档模型
//!
//! 文档由若干节组成，每节有自己的正文块和页眉 / 页脚。
//! 页眉页脚默认"链接到上一节"，需要显式断开后才能单独设置。

use std::path::Path;

use crate::error::{AppError, AppResult};

use super::writer;

/// 段落对齐
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

impl Align {
    pub(crate) fn as_ooxml(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
        }
    }
}

/// 列表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

/// 全文基础样式（Normal）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseStyle {
    pub font_family: String,
    pub font_size_pt: u32,
}

impl Default for BaseStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size_pt: 11,
        }
    }
}

/// 原样写入的 WordprocessingML 片段
///
/// 高层模型表达不了的装饰（例如水印）只能走这里。
/// 内容必须是已转义、结构完整的 `w:p` / `w:tbl` 级别标记。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMarkup(String);

impl RawMarkup {
    pub fn new(xml: impl Into<String>) -> Self {
        Self(xml.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 段落
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub(crate) text: String,
    pub(crate) style: Option<String>,
    pub(crate) align: Option<Align>,
    pub(crate) num_id: Option<u32>,
    pub(crate) page_break_before: bool,
    pub(crate) border_top: bool,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    /// 段落上方加一条分隔线
    pub fn with_border_top(mut self) -> Self {
        self.border_top = true;
        self
    }

    pub fn set_align(&mut self, align: Align) -> &mut Self {
        self.align = Some(align);
        self
    }

    /// 在段落开头插入分页符（同一段落内，不额外增加段落）
    pub fn set_page_break_before(&mut self) -> &mut Self {
        self.page_break_before = true;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 正文块
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    Paragraph(Paragraph),
    Table(Vec<Vec<String>>),
}

/// 页眉 / 页脚内容块
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BandBlock {
    Paragraph(Paragraph),
    Raw(RawMarkup),
}

/// 页眉或页脚
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooter {
    linked_to_previous: bool,
    pub(crate) blocks: Vec<BandBlock>,
}

impl Default for HeaderFooter {
    fn default() -> Self {
        Self {
            linked_to_previous: true,
            blocks: Vec::new(),
        }
    }
}

impl HeaderFooter {
    pub fn is_linked_to_previous(&self) -> bool {
        self.linked_to_previous
    }

    /// 断开与上一节的链接，之后本节使用自己的（可能为空的）内容
    pub fn unlink(&mut self) -> &mut Self {
        self.linked_to_previous = false;
        self
    }

    /// 清空内容（保持链接状态不变）
    pub fn clear(&mut self) -> &mut Self {
        self.blocks.clear();
        self
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> &mut Self {
        self.blocks.push(BandBlock::Paragraph(paragraph));
        self
    }

    pub fn inject_raw(&mut self, markup: RawMarkup) -> &mut Self {
        self.blocks.push(BandBlock::Raw(markup));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 模型层面可见的文本（不含原样标记）
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                BandBlock::Paragraph(p) => Some(p.text.as_str()),
                BandBlock::Raw(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 节
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub(crate) blocks: Vec<Block>,
    header: HeaderFooter,
    footer: HeaderFooter,
}

impl Section {
    pub fn header(&self) -> &HeaderFooter {
        &self.header
    }

    pub fn footer(&self) -> &HeaderFooter {
        &self.footer
    }

    pub fn header_mut(&mut self) -> &mut HeaderFooter {
        &mut self.header
    }

    pub fn footer_mut(&mut self) -> &mut HeaderFooter {
        &mut self.footer
    }
}

/// 列表句柄：同一个句柄下的列表项共享编号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHandle {
    kind: ListKind,
    num_id: u32,
}

/// 项目符号列表共用的编号实例
pub(crate) const BULLET_NUM_ID: u32 = 1;

/// 流式文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDocument {
    pub(crate) style: BaseStyle,
    sections: Vec<Section>,
    /// 每个有序列表一个编号实例，从 2 开始
    pub(crate) ordered_num_ids: Vec<u32>,
}

impl FlowDocument {
    /// 新文档，基础样式在添加任何内容之前确定
    pub fn new(style: BaseStyle) -> Self {
        Self {
            style,
            sections: vec![Section::default()],
            ordered_num_ids: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Section {
        if self.sections.is_empty() {
            self.sections.push(Section::default());
        }
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    fn push_paragraph(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        let section = self.current();
        section.blocks.push(Block::Paragraph(paragraph));
        match section.blocks.last_mut() {
            Some(Block::Paragraph(p)) => p,
            _ => unreachable!("paragraph was just pushed"),
        }
    }

    /// 追加标题（1-3 级，超出范围按最近的级别处理）
    pub fn append_heading(&mut self, text: impl Into<String>, level: u8) -> &mut Paragraph {
        let level = level.clamp(1, 3);
        self.push_paragraph(Paragraph {
            text: text.into(),
            style: Some(format!("Heading{}", level)),
            ..Default::default()
        })
    }

    pub fn append_paragraph(&mut self, text: impl Into<String>) -> &mut Paragraph {
        self.push_paragraph(Paragraph::new(text))
    }

    /// 开始一个新列表；有序列表各自从 1 开始编号
    pub fn begin_list(&mut self, kind: ListKind) -> ListHandle {
        let num_id = match kind {
            ListKind::Bullet => BULLET_NUM_ID,
            ListKind::Number => {
                let id = BULLET_NUM_ID + 1 + self.ordered_num_ids.len() as u32;
                self.ordered_num_ids.push(id);
                id
            }
        };
        ListHandle { kind, num_id }
    }

    pub fn append_list_item(&mut self, list: &ListHandle, text: impl Into<String>) -> &mut Paragraph {
        let style = match list.kind {
            ListKind::Bullet => "ListBullet",
            ListKind::Number => "ListNumber",
        };
        self.push_paragraph(Paragraph {
            text: text.into(),
            style: Some(style.to_string()),
            num_id: Some(list.num_id),
            ..Default::default()
        })
    }

    /// 追加表格：行数 × 最大列数，短行补空单元格
    pub fn append_table(&mut self, rows: &[Vec<String>]) {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return;
        }
        let rows = rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(columns, String::new());
                row
            })
            .collect();
        self.current().blocks.push(Block::Table(rows));
    }

    /// 在当前位置插入连续型分节符，返回新节
    ///
    /// 新节的页眉页脚默认链接到上一节
    pub fn add_section(&mut self) -> &mut Section {
        self.sections.push(Section::default());
        self.current()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// 写出 .docx
    pub fn save(&self, path: &Path) -> AppResult<()> {
        writer::write_package(self, path).map_err(AppError::docx_write_failed)
    }
}

impl Default for FlowDocument {
    fn default() -> Self {
        Self::new(BaseStyle::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sections_are_linked() {
        let mut doc = FlowDocument::default();
        doc.append_paragraph("body");
        let section = doc.add_section();
        assert!(section.header().is_linked_to_previous());
        assert!(section.footer().is_linked_to_previous());
        assert_eq!(doc.sections().len(), 2);
        assert!(doc.sections()[1].blocks.is_empty());
    }

    #[test]
    fn test_ordered_lists_get_fresh_numbering() {
        let mut doc = FlowDocument::default();
        let a = doc.begin_list(ListKind::Number);
        let b = doc.begin_list(ListKind::Number);
        let c = doc.begin_list(ListKind::Bullet);
        let d = doc.begin_list(ListKind::Bullet);
        assert_ne!(a, b);
        assert_eq!(c, d);
        assert_eq!(doc.ordered_num_ids, vec![2, 3]);
    }

    #[test]
    fn test_table_is_padded_to_max_columns() {
        let mut doc = FlowDocument::default();
        doc.append_table(&[vec!["a".into(), "b".into()], vec!["c".into()]]);
        doc.append_table(&[]);
        assert_eq!(
            doc.sections()[0].blocks,
            vec![Block::Table(vec![
                vec!["a".into(), "b".into()],
                vec!["c".into(), String::new()],
            ])]
        );
    }

    #[test]
    fn test_band_text_ignores_raw_markup() {
        let mut band = HeaderFooter::default();
        band.unlink()
            .push_paragraph(Paragraph::new("Header"))
            .inject_raw(RawMarkup::new("<w:p/>"));
        assert!(!band.is_linked_to_previous());
        assert_eq!(band.text(), "Header");
        band.clear();
        assert!(band.is_empty());
    }
}
