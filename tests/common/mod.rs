#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docgen_service::api::{create_router, AppState};
use docgen_service::error::AppResult;
use docgen_service::infrastructure::{PrintEngine, PrintJob, TempFileRegistry};
use docgen_service::services::html_parser::extract_text;
use docgen_service::{AppError, Config, GenerateFlow};
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub const PAGE_BREAK: &str = "page-break-before: always";

/// 测试用打印引擎：每个分页标记多一页，页眉页脚文本画在每一页上
#[derive(Default)]
pub struct FakePrintEngine {
    pub stages: Mutex<Vec<String>>,
    pub headers: Mutex<Vec<Option<String>>>,
}

impl FakePrintEngine {
    pub fn stages(&self) -> Vec<String> {
        self.stages.lock().unwrap().clone()
    }

    /// 每次打印收到的页眉模板
    pub fn headers(&self) -> Vec<Option<String>> {
        self.headers.lock().unwrap().clone()
    }
}

impl PrintEngine for FakePrintEngine {
    async fn print(&self, job: &PrintJob) -> AppResult<()> {
        self.stages.lock().unwrap().push(job.stage.to_string());
        self.headers.lock().unwrap().push(job.options.header_html.clone());
        let html = tokio::fs::read_to_string(&job.input_path).await?;
        let pages = 1 + html.matches(PAGE_BREAK).count();
        let header = job.options.header_html.as_deref().map(extract_text).unwrap_or_default();
        let footer = job.options.footer_html.as_deref().map(extract_text).unwrap_or_default();
        let bytes = build_pdf(pages, &header, &footer);
        tokio::fs::write(&job.output_path, bytes).await?;
        Ok(())
    }
}

/// 永远超时的打印引擎
pub struct StalledPrintEngine;

impl PrintEngine for StalledPrintEngine {
    async fn print(&self, _job: &PrintJob) -> AppResult<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

/// 浏览器不可用的打印引擎
pub struct BrokenPrintEngine;

impl PrintEngine for BrokenPrintEngine {
    async fn print(&self, _job: &PrintJob) -> AppResult<()> {
        Err(AppError::engine_unavailable(AppError::Other(
            "chromium not found".to_string(),
        )))
    }
}

fn build_pdf(pages: usize, header: &str, footer: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        // 和 Chromium 一样，页面开头翻转 y 轴且不包 q/Q
        let mut content = String::from("1 0 0 -1 0 842 cm\n");
        content.push_str(&format!("BT /F1 12 Tf 1 0 0 -1 72 142 Tm (Page {}) Tj ET\n", n));
        if !header.is_empty() {
            content.push_str(&format!("BT /F1 10 Tf 1 0 0 -1 72 42 Tm ({}) Tj ET\n", header));
        }
        if !footer.is_empty() {
            content.push_str(&format!("BT /F1 10 Tf 1 0 0 -1 72 812 Tm ({}) Tj ET\n", footer));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn test_config(temp_dir: &Path) -> Config {
    Config {
        temp_dir: Some(temp_dir.to_path_buf()),
        render_timeout_secs: 1,
        ..Config::default()
    }
}

pub fn test_router<E: PrintEngine>(
    engine: Arc<E>,
    registry: Arc<TempFileRegistry>,
    config: &Config,
) -> axum::Router {
    let flow = Arc::new(GenerateFlow::new(engine, registry, config));
    create_router(AppState::new(flow, config))
}

fn decoded(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn dict_of<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a lopdf::Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        _ => None,
    }
}

/// 页面自身内容流 + 页面引用的所有 Form XObject 的内容
pub fn page_text(doc: &Document, page_id: ObjectId) -> String {
    let mut bytes = doc.get_page_content(page_id).unwrap_or_default();
    let page = doc.get_object(page_id).and_then(Object::as_dict).unwrap();
    let xobjects = page
        .get(b"Resources")
        .ok()
        .and_then(|r| dict_of(doc, r))
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|x| dict_of(doc, x));
    if let Some(xobjects) = xobjects {
        for (_, value) in xobjects.iter() {
            if let Ok(id) = value.as_reference() {
                if let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) {
                    bytes.extend(decoded(stream));
                }
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn pages_text(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| page_text(&doc, id))
        .collect()
}

pub type Matrix = [f32; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn concat(m: Matrix, ctm: Matrix) -> Matrix {
    [
        m[0] * ctm[0] + m[1] * ctm[2],
        m[0] * ctm[1] + m[1] * ctm[3],
        m[2] * ctm[0] + m[3] * ctm[2],
        m[2] * ctm[1] + m[3] * ctm[3],
        m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
        m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
    ]
}

/// 每页执行 `Do` 时的变换矩阵（只回放页面自身的 q / Q / cm）
pub fn xobject_ctms(pdf: &[u8]) -> Vec<Vec<Matrix>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            let mut ctm = IDENTITY;
            let mut stack = Vec::new();
            let mut found = Vec::new();
            for op in content.operations {
                match op.operator.as_str() {
                    "q" => stack.push(ctm),
                    "Q" => ctm = stack.pop().unwrap_or(IDENTITY),
                    "cm" => {
                        let v: Vec<f32> = op.operands.iter().map(|o| o.as_float().unwrap()).collect();
                        ctm = concat([v[0], v[1], v[2], v[3], v[4], v[5]], ctm);
                    }
                    "Do" => found.push(ctm),
                    _ => {}
                }
            }
            found
        })
        .collect()
}
