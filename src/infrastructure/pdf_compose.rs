//! PDF 页面重组 - 基础设施层
//!
//! 打印引擎的页眉页脚只能"所有页相同"，所以"仅最后一页显示页脚"
//! 在渲染之后做：把单独渲染的页脚页以 Form XObject 的形式叠加到正文最后一页。

use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{AppError, AppResult, ConversionError};

/// 叠加到最后一页的 XObject 名
pub const FOOTER_XOBJECT: &str = "DocgenFooter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampSummary {
    /// 输出文档总页数
    pub page_count: usize,
    /// 被叠加的页码（从 1 开始）
    pub stamped_page: u32,
}

/// 读取 PDF 页数
pub fn page_count(path: &Path) -> AppResult<usize> {
    let doc = Document::load(path)?;
    Ok(doc.get_pages().len())
}

fn page_box(page: &Dictionary) -> Vec<Object> {
    if let Ok(arr) = page.get(b"CropBox").and_then(Object::as_array) {
        return arr.clone();
    }
    if let Ok(arr) = page.get(b"MediaBox").and_then(Object::as_array) {
        return arr.clone();
    }
    // A4
    vec![0.into(), 0.into(), 595.into(), 842.into()]
}

fn resolve_dict(doc: &Document, obj: Result<&Object, lopdf::Error>) -> Dictionary {
    match obj {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

fn page_dict(doc: &Document, page_id: ObjectId) -> AppResult<Dictionary> {
    Ok(doc.get_object(page_id).and_then(Object::as_dict)?.clone())
}

fn load_unencrypted(path: &Path, stage: &'static str) -> AppResult<Document> {
    let doc = Document::load(path)?;
    if doc.is_encrypted() {
        return Err(AppError::render_failed(stage, "rendered pdf is encrypted"));
    }
    if doc.get_pages().is_empty() {
        return Err(ConversionError::EmptyOutput { stage }.into());
    }
    Ok(doc)
}

/// 把 `overlay` 的第一页叠加到 `base` 的最后一页，其余页保持不变
pub fn stamp_on_last_page(base: &Path, overlay: &Path, out: &Path) -> AppResult<StampSummary> {
    let mut doc = load_unencrypted(base, "body")?;
    let mut overlay_doc = load_unencrypted(overlay, "footer")?;

    let base_pages = doc.get_pages();
    let page_count = base_pages.len();
    let (&last_no, &last_page_id) = base_pages
        .iter()
        .next_back()
        .ok_or(ConversionError::EmptyOutput { stage: "body" })?;

    // 重新编号后并入，避免对象 ID 冲突
    overlay_doc.renumber_objects_with(doc.max_id + 1);
    let overlay_page_id = *overlay_doc
        .get_pages()
        .values()
        .next()
        .ok_or(ConversionError::EmptyOutput { stage: "footer" })?;
    if overlay_doc.max_id > doc.max_id {
        doc.max_id = overlay_doc.max_id;
    }
    doc.objects.extend(overlay_doc.objects);

    let overlay_page = page_dict(&doc, overlay_page_id)?;
    let overlay_content = doc.get_page_content(overlay_page_id)?;
    let overlay_resources = match overlay_page.get(b"Resources") {
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .cloned()
            .unwrap_or_else(|_| Object::Dictionary(Dictionary::new())),
        Ok(Object::Dictionary(d)) => Object::Dictionary(d.clone()),
        _ => Object::Dictionary(Dictionary::new()),
    };

    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => Object::Array(page_box(&overlay_page)),
            "Resources" => overlay_resources,
        },
        overlay_content,
    ));

    let last_page = page_dict(&doc, last_page_id)?;
    let mut resources = resolve_dict(&doc, last_page.get(b"Resources"));
    let mut xobjects = resolve_dict(&doc, resources.get(b"XObject"));
    xobjects.set(FOOTER_XOBJECT.as_bytes().to_vec(), Object::Reference(form_id));
    resources.set("XObject", Object::Dictionary(xobjects));
    doc.get_object_mut(last_page_id)
        .and_then(Object::as_dict_mut)?
        .set("Resources", Object::Dictionary(resources));

    // Chromium 的页面内容以未配对的 `cm` 翻转坐标开头，
    // 原内容必须包进 q/Q，页脚才能在默认坐标系下绘制
    let original = doc.get_page_content(last_page_id)?;
    let mut content = Vec::with_capacity(original.len() + 64);
    content.extend_from_slice(b"q\n");
    content.extend_from_slice(&original);
    content.extend_from_slice(b"\nQ\n");
    content.extend_from_slice(format!("q 1 0 0 1 0 0 cm /{} Do Q\n", FOOTER_XOBJECT).as_bytes());
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    doc.get_object_mut(last_page_id)
        .and_then(Object::as_dict_mut)?
        .set("Contents", Object::Reference(content_id));

    // 并入的页脚页本身不在页面树里，prune 时一起清掉
    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();
    doc.save(out)
        .map_err(|e| AppError::file_write_failed(out.display().to_string(), e))?;

    debug!("页脚已叠加到第 {}/{} 页", last_no, page_count);
    Ok(StampSummary {
        page_count,
        stamped_page: last_no,
    })
}
