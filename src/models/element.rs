//! HTML 片段解析结果
//!
//! 解析一次，按顺序消费，解析后不再修改

/// 白名单块级元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedElement {
    /// h1 - h3
    Heading { level: u8, text: String },
    /// p，带分页标记
    Paragraph { text: String, page_break_before: bool },
    /// ul / ol
    List { ordered: bool, items: Vec<String> },
    /// table，每行已补齐到相同列数
    Table { rows: Vec<Vec<String>> },
}

impl ParsedElement {
    /// 表格列数（非表格为 0）
    pub fn column_count(&self) -> usize {
        match self {
            ParsedElement::Table { rows } => rows.first().map(Vec::len).unwrap_or(0),
            _ => 0,
        }
    }
}

/// 单个 HTML 片段的解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFragment {
    /// 按文档顺序排列的元素
    pub elements: Vec<ParsedElement>,
    /// 去标签后的纯文本
    pub text: String,
}

impl ParsedFragment {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 各类元素的数量：(标题, 段落, 列表项, 表格)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        self.elements.iter().fold((0, 0, 0, 0), |(h, p, l, t), el| match el {
            ParsedElement::Heading { .. } => (h + 1, p, l, t),
            ParsedElement::Paragraph { .. } => (h, p + 1, l, t),
            ParsedElement::List { items, .. } => (h, p, l + items.len(), t),
            ParsedElement::Table { .. } => (h, p, l, t + 1),
        })
    }
}

/// 页眉 / 页脚输入
///
/// PDF 的页眉页脚带渲染 HTML，DOCX 只写文本，所以两份都保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment {
    pub html: String,
    pub text: String,
}

impl HtmlFragment {
    /// DOCX 只写文字，没有文字的页眉页脚在 DOCX 里等同于未设置
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}
