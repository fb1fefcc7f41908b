//! HTML 片段解析 - 业务能力层
//!
//! 只识别固定白名单里的块级标签（h1-h3 / p / ul / ol / table），
//! 其他标签忽略而不是报错。底层解析器容错，畸形 HTML 不会失败，
//! 只会得到尽力而为的结构；空输入得到空序列。

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::models::{HtmlFragment, ParsedElement, ParsedFragment};

const BODY_TAGS: [&str; 7] = ["h1", "h2", "h3", "p", "ul", "ol", "table"];

fn page_break_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(page-break-before\s*:\s*always|(^|[;\s])break-before\s*:\s*page)")
            .expect("page-break pattern is valid")
    })
}

/// 解析正文片段
pub fn parse_fragment(html: &str) -> ParsedFragment {
    if html.trim().is_empty() {
        return ParsedFragment::default();
    }

    let document = Html::parse_fragment(html);
    let root = document.root_element();

    let elements = descendants_named(root, &BODY_TAGS)
        .filter_map(to_parsed_element)
        .collect();

    ParsedFragment {
        elements,
        text: element_text(root),
    }
}

/// 去标签后的纯文本（空白折叠并去首尾空白）
pub fn extract_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let document = Html::parse_fragment(html);
    element_text(document.root_element())
}

/// 解析页眉 / 页脚：空白输入视为未设置
///
/// 没有文字的标记（比如只有一个 logo `<img>`）仍然保留，PDF 照样渲染
pub fn parse_band(html: &str) -> Option<HtmlFragment> {
    let html = html.trim();
    if html.is_empty() {
        return None;
    }
    Some(HtmlFragment {
        html: html.to_string(),
        text: extract_text(html),
    })
}

fn to_parsed_element(el: ElementRef<'_>) -> Option<ParsedElement> {
    match el.value().name() {
        "h1" => Some(heading(1, el)),
        "h2" => Some(heading(2, el)),
        "h3" => Some(heading(3, el)),
        "p" => Some(ParsedElement::Paragraph {
            text: element_text(el),
            page_break_before: has_page_break_before(el),
        }),
        "ul" | "ol" => Some(ParsedElement::List {
            ordered: el.value().name() == "ol",
            items: descendants_named(el, &["li"]).map(element_text).collect(),
        }),
        "table" => parse_table(el),
        _ => None,
    }
}

fn heading(level: u8, el: ElementRef<'_>) -> ParsedElement {
    ParsedElement::Heading {
        level,
        text: element_text(el),
    }
}

/// 列数 = 各行单元格数的最大值；不足补空，多余丢弃
fn parse_table(el: ElementRef<'_>) -> Option<ParsedElement> {
    let raw_rows: Vec<Vec<String>> = descendants_named(el, &["tr"])
        .map(|row| descendants_named(row, &["td", "th"]).map(element_text).collect())
        .collect();

    let columns = raw_rows.iter().map(Vec::len).max().unwrap_or(0);
    if raw_rows.is_empty() || columns == 0 {
        return None;
    }

    let rows = raw_rows
        .into_iter()
        .map(|row| normalize_row(row, columns))
        .collect();
    Some(ParsedElement::Table { rows })
}

fn normalize_row(mut row: Vec<String>, columns: usize) -> Vec<String> {
    row.truncate(columns);
    row.resize(columns, String::new());
    row
}

fn has_page_break_before(el: ElementRef<'_>) -> bool {
    el.value()
        .attr("style")
        .map(|style| page_break_pattern().is_match(style))
        .unwrap_or(false)
}

/// 按文档顺序返回所有名字匹配的后代元素（包括嵌套的匹配）
fn descendants_named<'a>(
    el: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelisted_tags_in_document_order() {
        let fragment = parse_fragment(
            "<h1>Title</h1><div>ignored <span>inline</span></div>\
             <p>First</p><h3>Sub</h3><ul><li>a</li><li>b</li></ul>",
        );
        assert_eq!(
            fragment.elements,
            vec![
                ParsedElement::Heading { level: 1, text: "Title".into() },
                ParsedElement::Paragraph { text: "First".into(), page_break_before: false },
                ParsedElement::Heading { level: 3, text: "Sub".into() },
                ParsedElement::List { ordered: false, items: vec!["a".into(), "b".into()] },
            ]
        );
    }

    #[test]
    fn test_ragged_table_rows_are_padded() {
        let fragment = parse_fragment(
            "<table><tr><th>A</th><th>B</th><th>C</th></tr><tr><td>1</td></tr></table>",
        );
        assert_eq!(
            fragment.elements,
            vec![ParsedElement::Table {
                rows: vec![
                    vec!["A".into(), "B".into(), "C".into()],
                    vec!["1".into(), String::new(), String::new()],
                ]
            }]
        );
        assert_eq!(fragment.elements[0].column_count(), 3);
    }

    #[test]
    fn test_normalize_row_drops_extra_cells() {
        let row = normalize_row(vec!["a".into(), "b".into(), "c".into()], 2);
        assert_eq!(row, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_table_is_skipped() {
        assert!(parse_fragment("<table></table>").is_empty());
    }

    #[test]
    fn test_page_break_paragraph_is_tagged() {
        let fragment = parse_fragment(
            r#"<p>one</p><p style="color: red; Page-Break-Before : always">two</p><p style="break-before: page">three</p>"#,
        );
        let flags: Vec<bool> = fragment
            .elements
            .iter()
            .map(|el| matches!(el, ParsedElement::Paragraph { page_break_before: true, .. }))
            .collect();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_ordered_list_and_whitespace_collapse() {
        let fragment = parse_fragment("<ol><li>  first\n   item </li><li>second</li></ol>");
        assert_eq!(
            fragment.elements,
            vec![ParsedElement::List {
                ordered: true,
                items: vec!["first item".into(), "second".into()]
            }]
        );
    }

    #[test]
    fn test_malformed_and_empty_input_never_fail() {
        assert!(parse_fragment("").is_empty());
        let fragment = parse_fragment("<p>unclosed <b>bold<h2>next");
        assert!(!fragment.is_empty());
        assert_eq!(extract_text("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_band_text_and_html() {
        assert!(parse_band("   ").is_none());
        let band = parse_band(" <p>Page <i>footer</i></p> ").unwrap();
        assert_eq!(band.text, "Page footer");
        assert_eq!(band.html, "<p>Page <i>footer</i></p>");
    }

    #[test]
    fn test_markup_only_band_is_kept() {
        let band = parse_band(r#"<img src="logo.png">"#).unwrap();
        assert_eq!(band.html, r#"<img src="logo.png">"#);
        assert!(!band.has_text());
    }
}
