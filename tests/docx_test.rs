use std::io::Read;

use docgen_service::infrastructure::docx::DocxOutline;
use docgen_service::services::DocxAssembler;
use docgen_service::{Config, DocumentType, GenerationRequest};

const BODY: &str = r#"
    <h1>Annual Report</h1>
    <h2>Summary</h2>
    <p>First paragraph with <b>bold</b> text.</p>
    <div>ignored wrapper <span>inline</span></div>
    <p style="page-break-before: always">Second page.</p>
    <ul><li>alpha</li><li>beta</li></ul>
    <ol><li>one</li><li>two</li><li>three</li></ol>
    <table>
        <tr><th>Name</th><th>Qty</th><th>Price</th></tr>
        <tr><td>Widget</td><td>2</td></tr>
    </table>
    <h3>Notes</h3>
    <p></p>
"#;

fn assemble(request: &GenerationRequest) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.docx");
    DocxAssembler::new(&Config::default())
        .assemble(&request.to_input(), &output)
        .unwrap();
    (dir, output)
}

fn part(path: &std::path::Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_round_trip_recovers_element_counts() {
    let request = GenerationRequest::new(BODY, DocumentType::Docx)
        .with_header("<p>Header</p>")
        .with_footer("<p>Footer</p>")
        .with_watermark("draft");
    let expected = request.to_input().body.counts();
    let (_dir, output) = assemble(&request);

    let outline = DocxOutline::read(&output).unwrap();
    assert_eq!(
        (outline.headings, outline.paragraphs, outline.list_items, outline.tables),
        expected
    );
    assert_eq!(expected, (3, 3, 5, 1));
}

#[test]
fn test_footer_only_in_last_section() {
    let request = GenerationRequest::new(BODY, DocumentType::Docx).with_footer("<p>Page <i>footer</i></p>");
    let (_dir, output) = assemble(&request);

    let outline = DocxOutline::read(&output).unwrap();
    assert_eq!(outline.sections.len(), 2);
    assert_eq!(outline.sections_with_footer(), vec![1]);
    assert_eq!(outline.sections[1].footer_text, "Page footer");
    assert!(!outline.sections[0].footer_linked);
    assert!(outline.sections[0].footer_text.is_empty());
}

#[test]
fn test_watermark_in_every_section_header() {
    let request = GenerationRequest::new(BODY, DocumentType::Docx)
        .with_header("Company")
        .with_footer("Footer")
        .with_watermark("<span>Internal</span>");
    let (_dir, output) = assemble(&request);

    let outline = DocxOutline::read(&output).unwrap();
    assert!(outline.sections.len() >= 2);
    for section in &outline.sections {
        assert!(!section.header_linked);
        assert_eq!(section.header_text, "Company\nINTERNAL");
    }
}

#[test]
fn test_no_footer_means_single_section() {
    let request = GenerationRequest::new("<p>only</p>", DocumentType::Docx).with_watermark("x");
    let (_dir, output) = assemble(&request);

    let outline = DocxOutline::read(&output).unwrap();
    assert_eq!(outline.sections.len(), 1);
    assert_eq!(outline.sections[0].header_text, "X");
    assert!(outline.sections_with_footer().is_empty());
}

#[test]
fn test_package_markup() {
    let request = GenerationRequest::new(BODY, DocumentType::Docx)
        .with_footer("Footer")
        .with_watermark("draft");
    let (_dir, output) = assemble(&request);

    let document = part(&output, "word/document.xml");
    // 分页符在段落内部
    assert!(document.contains(r#"<w:br w:type="page"/>"#));
    assert!(document.contains(r#"<w:type w:val="continuous"/>"#));
    assert!(document.contains(r#"<w:jc w:val="center"/>"#));
    assert!(document.contains(r#"<w:tblStyle w:val="TableGrid"/>"#));

    let numbering = part(&output, "word/numbering.xml");
    assert!(numbering.contains(r#"<w:startOverride w:val="1"/>"#));

    let styles = part(&output, "word/styles.xml");
    assert!(styles.contains(r#"w:ascii="Arial""#));
    assert!(styles.contains(r#"<w:sz w:val="22"/>"#));

    let header = part(&output, "word/header1.xml");
    assert!(header.contains(r#"<w:color w:val="C8C8C8"/>"#));
    assert!(header.contains(">DRAFT</w:t>"));

    let footer = part(&output, "word/footer2.xml");
    assert!(footer.contains("<w:pBdr>"));
    assert!(footer.contains(">Footer</w:t>"));
}
