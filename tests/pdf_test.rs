mod common;

use std::sync::Arc;

use common::{pages_text, test_config, xobject_ctms, FakePrintEngine, IDENTITY, PAGE_BREAK};
use docgen_service::infrastructure::pdf_compose::FOOTER_XOBJECT;
use docgen_service::services::PdfAssembler;
use docgen_service::{DocumentType, GenerationRequest};

fn body_with_breaks(breaks: usize) -> String {
    let mut html = String::from("<h1>Title</h1><p>first</p>");
    for n in 0..breaks {
        html.push_str(&format!("<p style=\"{}\">page {}</p>", PAGE_BREAK, n + 2));
    }
    html
}

#[tokio::test]
async fn test_footer_stamped_on_last_of_many_pages() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakePrintEngine::default());
    let assembler = PdfAssembler::new(Arc::clone(&engine), &test_config(dir.path()));

    let request = GenerationRequest::new(body_with_breaks(4), DocumentType::Pdf)
        .with_footer("<p>Thanks for reading</p>")
        .with_watermark("Confidential");
    let output = dir.path().join("out.pdf");
    let path = assembler.assemble(&request.to_input(), &output).await.unwrap();
    assert_eq!(path, output);

    let bytes = std::fs::read(&output).unwrap();
    let pages = pages_text(&bytes);
    assert_eq!(pages.len(), 5);
    let stamped: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, text)| text.contains("Thanks for reading"))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(stamped, vec![4]);
    assert!(pages[4].contains(&format!("/{} Do", FOOTER_XOBJECT)));
    // 页面开头的 y 轴翻转不能作用到页脚上
    let ctms = xobject_ctms(&bytes);
    assert!(ctms[..4].iter().all(Vec::is_empty));
    assert_eq!(ctms[4], vec![IDENTITY]);

    // 中间文件所在的临时目录已删除，只剩输出
    let left: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(left.len(), 1);
}

#[tokio::test]
async fn test_header_repeats_without_recomposition() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakePrintEngine::default());
    let assembler = PdfAssembler::new(Arc::clone(&engine), &test_config(dir.path()));

    let request =
        GenerationRequest::new(body_with_breaks(1), DocumentType::Pdf).with_header("<p>Acme Corp</p>");
    let output = dir.path().join("out.pdf");
    assembler.assemble(&request.to_input(), &output).await.unwrap();

    let pages = pages_text(&std::fs::read(&output).unwrap());
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|text| text.contains("Acme Corp")));
    assert!(pages.iter().all(|text| !text.contains(FOOTER_XOBJECT)));
    assert_eq!(engine.stages(), vec!["body"]);
}

#[tokio::test]
async fn test_single_page_document_gets_footer() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakePrintEngine::default());
    let assembler = PdfAssembler::new(engine, &test_config(dir.path()));

    let request = GenerationRequest::new("<p>short</p>", DocumentType::Pdf).with_footer("End");
    let output = dir.path().join("out.pdf");
    assembler.assemble(&request.to_input(), &output).await.unwrap();

    let pages = pages_text(&std::fs::read(&output).unwrap());
    assert_eq!(pages.len(), 1);
    assert!(pages[0].contains("End"));
}

#[tokio::test]
async fn test_image_only_footer_still_printed() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakePrintEngine::default());
    let assembler = PdfAssembler::new(Arc::clone(&engine), &test_config(dir.path()));

    let request = GenerationRequest::new("<p>short</p>", DocumentType::Pdf)
        .with_header(r#"<img src="data:image/png;base64,AAAA">"#)
        .with_footer(r#"<img src="data:image/png;base64,BBBB">"#);
    let output = dir.path().join("out.pdf");
    assembler.assemble(&request.to_input(), &output).await.unwrap();

    assert_eq!(engine.stages(), vec!["body", "footer"]);
    let headers = engine.headers();
    assert!(headers[0].as_deref().is_some_and(|h| h.contains("AAAA")));
    let pages = pages_text(&std::fs::read(&output).unwrap());
    assert!(pages[0].contains(FOOTER_XOBJECT));
}
