//! 请求校验
//!
//! 校验顺序：必填字段 → document_type 取值 → HTML 字段类型 → 水印类型。
//! 返回第一个错误。

use serde_json::Value;

use crate::error::ValidationError;
use crate::models::{DocumentType, GenerationRequest};

pub(crate) const REQUIRED_FIELDS: [&str; 2] = ["content_html", "document_type"];
pub(crate) const HTML_FIELDS: [&str; 3] = ["content_html", "header_html", "footer_html"];

pub fn validate_document_request(data: &Value) -> Result<GenerationRequest, ValidationError> {
    let object = data.as_object().ok_or_else(|| ValidationError::InvalidJson {
        detail: "expected a JSON object".to_string(),
    })?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            });
        }
    }

    let raw_type = &object["document_type"];
    let document_type = match raw_type.as_str() {
        Some(value) => DocumentType::parse(value).map_err(|_| ValidationError::InvalidDocumentType {
            value: value.to_string(),
        })?,
        None => {
            return Err(ValidationError::InvalidDocumentType {
                value: raw_type.to_string(),
            })
        }
    };

    for field in HTML_FIELDS {
        if let Some(value) = object.get(field) {
            if !value.is_string() {
                return Err(ValidationError::NotAString {
                    field: field.to_string(),
                });
            }
        }
    }

    let watermark = match object.get("watermark") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => return Err(ValidationError::InvalidWatermark),
    };

    let text_field = |field: &str| object.get(field).and_then(Value::as_str).map(str::to_string);

    Ok(GenerationRequest {
        content_html: text_field("content_html").unwrap_or_default(),
        header_html: text_field("header_html"),
        footer_html: text_field("footer_html"),
        document_type,
        watermark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(data: Value) -> String {
        validate_document_request(&data).unwrap_err().to_string()
    }

    #[test]
    fn test_missing_fields_named_in_order() {
        assert_eq!(message(json!({})), "Missing required field: content_html");
        assert_eq!(
            message(json!({"content_html": "<p>x</p>"})),
            "Missing required field: document_type"
        );
    }

    #[test]
    fn test_invalid_document_type() {
        assert_eq!(
            message(json!({"content_html": "x", "document_type": "xml"})),
            "Invalid document_type: xml. Must be one of ['pdf', 'docx']"
        );
        assert!(message(json!({"content_html": "x", "document_type": 3}))
            .starts_with("Invalid document_type: 3"));
    }

    #[test]
    fn test_field_types() {
        assert_eq!(
            message(json!({"content_html": 1, "document_type": "pdf"})),
            "Field content_html must be a string"
        );
        assert_eq!(
            message(json!({"content_html": "x", "document_type": "pdf", "footer_html": null})),
            "Field footer_html must be a string"
        );
        assert_eq!(
            message(json!({"content_html": "x", "document_type": "pdf", "watermark": 5})),
            "Watermark must be a string"
        );
    }

    #[test]
    fn test_non_object_body() {
        assert!(message(json!(["pdf"])).starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let request = validate_document_request(&json!({
            "content_html": "<p>x</p>",
            "document_type": "DOCX",
            "header_html": "<b>h</b>",
            "watermark": null
        }))
        .unwrap();
        assert_eq!(request.document_type, DocumentType::Docx);
        assert_eq!(request.header_html.as_deref(), Some("<b>h</b>"));
        assert!(request.footer_html.is_none());
        assert!(request.watermark.is_none());
    }
}
