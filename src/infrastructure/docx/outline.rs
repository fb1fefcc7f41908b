//! 读回 .docx 的结构：元素计数 + 每节实际生效的页眉 / 页脚文本

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

/// 某一节的页眉 / 页脚
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOutline {
    pub header_text: String,
    pub footer_text: String,
    pub header_linked: bool,
    pub footer_linked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxOutline {
    pub headings: usize,
    pub paragraphs: usize,
    pub list_items: usize,
    pub tables: usize,
    pub sections: Vec<SectionOutline>,
}

#[derive(Default)]
struct SectRefs {
    header: Option<String>,
    footer: Option<String>,
}

#[derive(Default)]
struct ParagraphState {
    style: Option<String>,
    numbered: bool,
    section_break: bool,
}

impl DocxOutline {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let f = File::open(path).with_context(|| format!("open docx: {}", path.display()))?;
        let mut zip = ZipArchive::new(f).context("read zip")?;

        let document = read_entry(&mut zip, "word/document.xml")?;
        let rels = read_entry(&mut zip, "word/_rels/document.xml.rels")?;
        let targets = parse_relationships(&rels)?;

        let (mut outline, sect_refs) = parse_document(&document)?;

        let mut previous = SectionOutline::default();
        for refs in sect_refs {
            let mut section = SectionOutline {
                header_linked: refs.header.is_none(),
                footer_linked: refs.footer.is_none(),
                header_text: previous.header_text.clone(),
                footer_text: previous.footer_text.clone(),
            };
            if let Some(rid) = refs.header {
                section.header_text = read_band_text(&mut zip, &targets, &rid)?;
            }
            if let Some(rid) = refs.footer {
                section.footer_text = read_band_text(&mut zip, &targets, &rid)?;
            }
            previous = section.clone();
            outline.sections.push(section);
        }
        Ok(outline)
    }

    /// 页脚文本非空的节的下标
    pub fn sections_with_footer(&self) -> Vec<usize> {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.footer_text.is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> anyhow::Result<Vec<u8>> {
    let mut entry = zip
        .by_name(name)
        .with_context(|| format!("missing zip entry: {}", name))?;
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .with_context(|| format!("read zip entry: {}", name))?;
    Ok(data)
}

fn read_band_text(
    zip: &mut ZipArchive<File>,
    targets: &HashMap<String, String>,
    rid: &str,
) -> anyhow::Result<String> {
    let target = targets
        .get(rid)
        .with_context(|| format!("unknown relationship: {}", rid))?;
    let data = read_entry(zip, &format!("word/{}", target))?;
    paragraph_text(&data)
}

fn attr(start: &BytesStart<'_>, key: &[u8]) -> anyhow::Result<Option<String>> {
    for a in start.attributes() {
        let a = a.context("attr")?;
        if a.key.as_ref() == key {
            return Ok(Some(a.unescape_value().context("attr value")?.into_owned()));
        }
    }
    Ok(None)
}

fn reader(xml: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().expand_empty_elements = true;
    reader
}

fn parse_relationships(xml: &[u8]) -> anyhow::Result<HashMap<String, String>> {
    let mut reader = reader(xml);
    let mut targets = HashMap::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("read rels")? {
            Event::Eof => break,
            Event::Start(s) if s.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&s, b"Id")?, attr(&s, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            _ => {}
        }
    }
    Ok(targets)
}

fn parse_document(xml: &[u8]) -> anyhow::Result<(DocxOutline, Vec<SectRefs>)> {
    let mut reader = reader(xml);
    let mut outline = DocxOutline::default();
    let mut sections = Vec::new();
    let mut table_depth = 0usize;
    let mut paragraph: Option<ParagraphState> = None;
    let mut sect: Option<SectRefs> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("read document.xml")? {
            Event::Eof => break,
            Event::Start(s) => match s.name().as_ref() {
                b"w:tbl" => {
                    if table_depth == 0 {
                        outline.tables += 1;
                    }
                    table_depth += 1;
                }
                b"w:p" => paragraph = Some(ParagraphState::default()),
                b"w:pStyle" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.style = attr(&s, b"w:val")?;
                    }
                }
                b"w:numPr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.numbered = true;
                    }
                }
                b"w:sectPr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.section_break = true;
                    }
                    sect = Some(SectRefs::default());
                }
                b"w:headerReference" | b"w:footerReference" => {
                    let is_default = attr(&s, b"w:type")?.map_or(true, |t| t == "default");
                    if let (Some(refs), true) = (sect.as_mut(), is_default) {
                        let rid = attr(&s, b"r:id")?;
                        if s.name().as_ref() == b"w:headerReference" {
                            refs.header = rid;
                        } else {
                            refs.footer = rid;
                        }
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:sectPr" => {
                    if let Some(refs) = sect.take() {
                        sections.push(refs);
                    }
                }
                b"w:p" => {
                    if let Some(p) = paragraph.take() {
                        if table_depth == 0 && !p.section_break {
                            classify(&mut outline, &p);
                        }
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    Ok((outline, sections))
}

fn classify(outline: &mut DocxOutline, p: &ParagraphState) {
    let style = p.style.as_deref().unwrap_or("");
    if style.starts_with("Heading") {
        outline.headings += 1;
    } else if p.numbered || style.starts_with("List") {
        outline.list_items += 1;
    } else {
        outline.paragraphs += 1;
    }
}

/// 部件里所有段落的文本，按段落换行
fn paragraph_text(xml: &[u8]) -> anyhow::Result<String> {
    let mut reader = reader(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).context("read band part")? {
            Event::Eof => break,
            Event::Start(s) if s.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let line = current.trim().to_string();
                    if !line.is_empty() {
                        lines.push(line);
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().context("unescape text")?);
            }
            _ => {}
        }
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text_joins_lines() {
        let xml = br#"<w:hdr xmlns:w="x"><w:p><w:r><w:t>Head &amp; co</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>MARK</w:t></w:r></w:p></w:hdr>"#;
        assert_eq!(paragraph_text(xml).unwrap(), "Head & co\nMARK");
    }

    #[test]
    fn test_section_break_and_table_paragraphs_not_counted() {
        let xml = br#"<w:document xmlns:w="x"><w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr></w:p>
            <w:p><w:pPr><w:pStyle w:val="ListNumber"/><w:numPr><w:numId w:val="2"/></w:numPr></w:pPr></w:p>
            <w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl>
            <w:p/>
            <w:p><w:pPr><w:sectPr><w:footerReference w:type="default" r:id="rId3"/></w:sectPr></w:pPr></w:p>
            <w:sectPr/>
        </w:body></w:document>"#;
        let (outline, sections) = parse_document(xml).unwrap();
        assert_eq!(
            (outline.headings, outline.paragraphs, outline.list_items, outline.tables),
            (1, 1, 1, 1)
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].footer.as_deref(), Some("rId3"));
        assert!(sections[1].footer.is_none());
    }
}
