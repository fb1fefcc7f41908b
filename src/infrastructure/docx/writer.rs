//! OOXML 打包：把 `FlowDocument` 写成 .docx（zip + WordprocessingML）

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::model::{BandBlock, Block, FlowDocument, HeaderFooter, Paragraph, BULLET_NUM_ID};

pub(crate) const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
const REL_HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const REL_FOOTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";

const CT_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
const CT_HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
const CT_FOOTER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

// A4，单位 twip
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const PAGE_MARGIN: u32 = 1440;
const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * PAGE_MARGIN;

/// 小型 XML 构建器
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> anyhow::Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .context("write decl")?;
        Ok(Self { writer })
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> anyhow::Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer
            .write_event(Event::Start(start))
            .with_context(|| format!("write <{}>", name))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> anyhow::Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .with_context(|| format!("write </{}>", name))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> anyhow::Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer
            .write_event(Event::Empty(start))
            .with_context(|| format!("write <{}/>", name))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> anyhow::Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .context("write text")?;
        Ok(())
    }

    /// 原样写入（调用方保证已转义）
    fn raw(&mut self, xml: &str) -> anyhow::Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(xml)))
            .context("write raw markup")?;
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// 一个独立的页眉 / 页脚部件
struct BandPart {
    kind: BandKind,
    index: usize,
    rel_id: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BandKind {
    Header,
    Footer,
}

impl BandPart {
    fn file_name(&self) -> String {
        match self.kind {
            BandKind::Header => format!("header{}.xml", self.index),
            BandKind::Footer => format!("footer{}.xml", self.index),
        }
    }
}

/// 每节的页眉 / 页脚引用（None = 链接到上一节）
struct SectionRefs {
    header: Option<usize>,
    footer: Option<usize>,
}

pub(crate) fn write_package(doc: &FlowDocument, path: &Path) -> anyhow::Result<()> {
    // 分配页眉页脚部件，rId1 / rId2 留给 styles / numbering
    let mut parts: Vec<(BandPart, &HeaderFooter)> = Vec::new();
    let mut refs = Vec::new();
    let (mut headers, mut footers) = (0, 0);
    for section in doc.sections() {
        let mut section_refs = SectionRefs {
            header: None,
            footer: None,
        };
        for (kind, band) in [
            (BandKind::Header, section.header()),
            (BandKind::Footer, section.footer()),
        ] {
            if band.is_linked_to_previous() {
                continue;
            }
            let index = match kind {
                BandKind::Header => {
                    headers += 1;
                    headers
                }
                BandKind::Footer => {
                    footers += 1;
                    footers
                }
            };
            let slot = parts.len();
            parts.push((
                BandPart {
                    kind,
                    index,
                    rel_id: format!("rId{}", slot + 3),
                },
                band,
            ));
            match kind {
                BandKind::Header => section_refs.header = Some(slot),
                BandKind::Footer => section_refs.footer = Some(slot),
            }
        }
        refs.push(section_refs);
    }

    let bands: Vec<&BandPart> = parts.iter().map(|(part, _)| part).collect();

    let mut files: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".to_string(), content_types_xml(&bands)?),
        ("_rels/.rels".to_string(), package_rels_xml()?),
        ("word/document.xml".to_string(), document_xml(doc, &refs, &bands)?),
        ("word/styles.xml".to_string(), styles_xml(doc)?),
        ("word/numbering.xml".to_string(), numbering_xml(doc)?),
        ("word/_rels/document.xml.rels".to_string(), document_rels_xml(&bands)?),
    ];
    for (part, band) in &parts {
        files.push((format!("word/{}", part.file_name()), band_xml(part.kind, band)?));
    }

    let file = File::create(path).with_context(|| format!("create docx: {}", path.display()))?;
    let mut zout = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in &files {
        zout.start_file(name.as_str(), opts)
            .with_context(|| format!("start zip file: {}", name))?;
        zout.write_all(data)
            .with_context(|| format!("write zip file: {}", name))?;
    }
    zout.finish().context("finish zip")?;
    Ok(())
}

fn content_types_xml(bands: &[&BandPart]) -> anyhow::Result<Vec<u8>> {
    let mut x = XmlOut::new()?;
    x.open("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    x.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    x.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    x.empty("Override", &[("PartName", "/word/document.xml"), ("ContentType", CT_MAIN)])?;
    x.empty("Override", &[("PartName", "/word/styles.xml"), ("ContentType", CT_STYLES)])?;
    x.empty(
        "Override",
        &[("PartName", "/word/numbering.xml"), ("ContentType", CT_NUMBERING)],
    )?;
    for band in bands {
        let part_name = format!("/word/{}", band.file_name());
        let content_type = match band.kind {
            BandKind::Header => CT_HEADER,
            BandKind::Footer => CT_FOOTER,
        };
        x.empty("Override", &[("PartName", part_name.as_str()), ("ContentType", content_type)])?;
    }
    x.close("Types")?;
    Ok(x.finish())
}

fn package_rels_xml() -> anyhow::Result<Vec<u8>> {
    let mut x = XmlOut::new()?;
    x.open("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    x.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_OFFICE_DOCUMENT), ("Target", "word/document.xml")],
    )?;
    x.close("Relationships")?;
    Ok(x.finish())
}

fn document_rels_xml(bands: &[&BandPart]) -> anyhow::Result<Vec<u8>> {
    let mut x = XmlOut::new()?;
    x.open("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    x.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_STYLES), ("Target", "styles.xml")],
    )?;
    x.empty(
        "Relationship",
        &[("Id", "rId2"), ("Type", REL_NUMBERING), ("Target", "numbering.xml")],
    )?;
    for band in bands {
        let rel_type = match band.kind {
            BandKind::Header => REL_HEADER,
            BandKind::Footer => REL_FOOTER,
        };
        let target = band.file_name();
        x.empty(
            "Relationship",
            &[("Id", band.rel_id.as_str()), ("Type", rel_type), ("Target", target.as_str())],
        )?;
    }
    x.close("Relationships")?;
    Ok(x.finish())
}

fn document_xml(
    doc: &FlowDocument,
    refs: &[SectionRefs],
    bands: &[&BandPart],
) -> anyhow::Result<Vec<u8>> {
    let mut x = XmlOut::new()?;
    x.open("w:document", &[("xmlns:w", NS_W), ("xmlns:r", NS_R)])?;
    x.open("w:body", &[])?;

    let count = doc.sections().len();
    for (i, (section, section_refs)) in doc.sections().iter().zip(refs).enumerate() {
        for block in &section.blocks {
            match block {
                Block::Paragraph(p) => write_paragraph(&mut x, p)?,
                Block::Table(rows) => write_table(&mut x, rows)?,
            }
        }
        if i + 1 < count {
            // 非最后一节：分节属性挂在一个空段落上
            x.open("w:p", &[])?;
            x.open("w:pPr", &[])?;
            write_sect_pr(&mut x, section_refs, bands, i > 0)?;
            x.close("w:pPr")?;
            x.close("w:p")?;
        } else {
            write_sect_pr(&mut x, section_refs, bands, i > 0)?;
        }
    }

    x.close("w:body")?;
    x.close("w:document")?;
    Ok(x.finish())
}

fn write_sect_pr(
    x: &mut XmlOut,
    refs: &SectionRefs,
    bands: &[&BandPart],
    continuous: bool,
) -> anyhow::Result<()> {
    x.open("w:sectPr", &[])?;
    if let Some(slot) = refs.header {
        x.empty(
            "w:headerReference",
            &[("w:type", "default"), ("r:id", bands[slot].rel_id.as_str())],
        )?;
    }
    if let Some(slot) = refs.footer {
        x.empty(
            "w:footerReference",
            &[("w:type", "default"), ("r:id", bands[slot].rel_id.as_str())],
        )?;
    }
    if continuous {
        x.empty("w:type", &[("w:val", "continuous")])?;
    }
    let (w, h, m) = (PAGE_WIDTH.to_string(), PAGE_HEIGHT.to_string(), PAGE_MARGIN.to_string());
    x.empty("w:pgSz", &[("w:w", w.as_str()), ("w:h", h.as_str())])?;
    x.empty(
        "w:pgMar",
        &[
            ("w:top", m.as_str()),
            ("w:right", m.as_str()),
            ("w:bottom", m.as_str()),
            ("w:left", m.as_str()),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    x.close("w:sectPr")
}

fn write_paragraph(x: &mut XmlOut, p: &Paragraph) -> anyhow::Result<()> {
    x.open("w:p", &[])?;
    let has_props = p.style.is_some() || p.num_id.is_some() || p.border_top || p.align.is_some();
    if has_props {
        x.open("w:pPr", &[])?;
        if let Some(style) = &p.style {
            x.empty("w:pStyle", &[("w:val", style.as_str())])?;
        }
        if let Some(num_id) = p.num_id {
            let num_id = num_id.to_string();
            x.open("w:numPr", &[])?;
            x.empty("w:ilvl", &[("w:val", "0")])?;
            x.empty("w:numId", &[("w:val", num_id.as_str())])?;
            x.close("w:numPr")?;
        }
        if p.border_top {
            x.open("w:pBdr", &[])?;
            x.empty(
                "w:top",
                &[("w:val", "single"), ("w:sz", "6"), ("w:space", "1"), ("w:color", "auto")],
            )?;
            x.close("w:pBdr")?;
        }
        if let Some(align) = p.align {
            x.empty("w:jc", &[("w:val", align.as_ooxml())])?;
        }
        x.close("w:pPr")?;
    }
    if p.page_break_before {
        x.open("w:r", &[])?;
        x.empty("w:br", &[("w:type", "page")])?;
        x.close("w:r")?;
    }
    if !p.text.is_empty() {
        write_text_run(x, &p.text)?;
    }
    x.close("w:p")
}

fn write_text_run(x: &mut XmlOut, text: &str) -> anyhow::Result<()> {
    x.open("w:r", &[])?;
    x.open("w:t", &[("xml:space", "preserve")])?;
    x.text(text)?;
    x.close("w:t")?;
    x.close("w:r")
}

fn write_table(x: &mut XmlOut, rows: &[Vec<String>]) -> anyhow::Result<()> {
    let columns = rows.first().map(Vec::len).unwrap_or(0).max(1);
    let col_width = (TEXT_WIDTH / columns as u32).to_string();

    x.open("w:tbl", &[])?;
    x.open("w:tblPr", &[])?;
    x.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
    x.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    x.close("w:tblPr")?;
    x.open("w:tblGrid", &[])?;
    for _ in 0..columns {
        x.empty("w:gridCol", &[("w:w", col_width.as_str())])?;
    }
    x.close("w:tblGrid")?;
    for row in rows {
        x.open("w:tr", &[])?;
        for cell in row {
            x.open("w:tc", &[])?;
            x.open("w:tcPr", &[])?;
            x.empty("w:tcW", &[("w:w", col_width.as_str()), ("w:type", "dxa")])?;
            x.close("w:tcPr")?;
            // 单元格至少要有一个段落
            x.open("w:p", &[])?;
            if !cell.is_empty() {
                write_text_run(x, cell)?;
            }
            x.close("w:p")?;
            x.close("w:tc")?;
        }
        x.close("w:tr")?;
    }
    x.close("w:tbl")
}

fn band_xml(kind: BandKind, band: &HeaderFooter) -> anyhow::Result<Vec<u8>> {
    let root = match kind {
        BandKind::Header => "w:hdr",
        BandKind::Footer => "w:ftr",
    };
    let mut x = XmlOut::new()?;
    x.open(root, &[("xmlns:w", NS_W), ("xmlns:r", NS_R)])?;
    if band.is_empty() {
        // 空部件也需要一个段落
        x.empty("w:p", &[])?;
    }
    for block in &band.blocks {
        match block {
            BandBlock::Paragraph(p) => write_paragraph(&mut x, p)?,
            BandBlock::Raw(markup) => x.raw(markup.as_str())?,
        }
    }
    x.close(root)?;
    Ok(x.finish())
}

fn styles_xml(doc: &FlowDocument) -> anyhow::Result<Vec<u8>> {
    let font = doc.style.font_family.as_str();
    let size = (doc.style.font_size_pt * 2).to_string();

    let mut x = XmlOut::new()?;
    x.open("w:styles", &[("xmlns:w", NS_W)])?;

    x.open("w:docDefaults", &[])?;
    x.open("w:rPrDefault", &[])?;
    x.open("w:rPr", &[])?;
    write_fonts(&mut x, font)?;
    x.empty("w:sz", &[("w:val", size.as_str())])?;
    x.close("w:rPr")?;
    x.close("w:rPrDefault")?;
    x.close("w:docDefaults")?;

    x.open(
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    )?;
    x.empty("w:name", &[("w:val", "Normal")])?;
    x.open("w:rPr", &[])?;
    write_fonts(&mut x, font)?;
    x.empty("w:sz", &[("w:val", size.as_str())])?;
    x.close("w:rPr")?;
    x.close("w:style")?;

    for (level, half_points) in [(1u8, "32"), (2, "28"), (3, "24")] {
        let id = format!("Heading{}", level);
        let name = format!("heading {}", level);
        let outline = (level - 1).to_string();
        x.open("w:style", &[("w:type", "paragraph"), ("w:styleId", id.as_str())])?;
        x.empty("w:name", &[("w:val", name.as_str())])?;
        x.empty("w:basedOn", &[("w:val", "Normal")])?;
        x.empty("w:next", &[("w:val", "Normal")])?;
        x.open("w:pPr", &[])?;
        x.empty("w:keepNext", &[])?;
        x.empty("w:spacing", &[("w:before", "240"), ("w:after", "120")])?;
        x.empty("w:outlineLvl", &[("w:val", outline.as_str())])?;
        x.close("w:pPr")?;
        x.open("w:rPr", &[])?;
        x.empty("w:b", &[])?;
        x.empty("w:sz", &[("w:val", half_points)])?;
        x.close("w:rPr")?;
        x.close("w:style")?;
    }

    for (id, name) in [("ListBullet", "List Bullet"), ("ListNumber", "List Number")] {
        x.open("w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
        x.empty("w:name", &[("w:val", name)])?;
        x.empty("w:basedOn", &[("w:val", "Normal")])?;
        x.close("w:style")?;
    }

    x.open("w:style", &[("w:type", "table"), ("w:styleId", "TableGrid")])?;
    x.empty("w:name", &[("w:val", "Table Grid")])?;
    x.open("w:tblPr", &[])?;
    x.open("w:tblBorders", &[])?;
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        x.empty(
            edge,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    x.close("w:tblBorders")?;
    x.close("w:tblPr")?;
    x.close("w:style")?;

    x.close("w:styles")?;
    Ok(x.finish())
}

fn write_fonts(x: &mut XmlOut, font: &str) -> anyhow::Result<()> {
    x.empty(
        "w:rFonts",
        &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font), ("w:eastAsia", font)],
    )
}

fn numbering_xml(doc: &FlowDocument) -> anyhow::Result<Vec<u8>> {
    let mut x = XmlOut::new()?;
    x.open("w:numbering", &[("xmlns:w", NS_W)])?;

    // abstractNum 0: 项目符号；1: 十进制编号
    for (abstract_id, fmt, text) in [("0", "bullet", "\u{2022}"), ("1", "decimal", "%1.")] {
        x.open("w:abstractNum", &[("w:abstractNumId", abstract_id)])?;
        x.open("w:lvl", &[("w:ilvl", "0")])?;
        x.empty("w:start", &[("w:val", "1")])?;
        x.empty("w:numFmt", &[("w:val", fmt)])?;
        x.empty("w:lvlText", &[("w:val", text)])?;
        x.empty("w:lvlJc", &[("w:val", "left")])?;
        x.open("w:pPr", &[])?;
        x.empty("w:ind", &[("w:left", "720"), ("w:hanging", "360")])?;
        x.close("w:pPr")?;
        x.close("w:lvl")?;
        x.close("w:abstractNum")?;
    }

    let bullet_id = BULLET_NUM_ID.to_string();
    x.open("w:num", &[("w:numId", bullet_id.as_str())])?;
    x.empty("w:abstractNumId", &[("w:val", "0")])?;
    x.close("w:num")?;

    for num_id in &doc.ordered_num_ids {
        let num_id = num_id.to_string();
        x.open("w:num", &[("w:numId", num_id.as_str())])?;
        x.empty("w:abstractNumId", &[("w:val", "1")])?;
        x.open("w:lvlOverride", &[("w:ilvl", "0")])?;
        x.empty("w:startOverride", &[("w:val", "1")])?;
        x.close("w:lvlOverride")?;
        x.close("w:num")?;
    }

    x.close("w:numbering")?;
    Ok(x.finish())
}
