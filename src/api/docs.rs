//! 接口文档
//!
//! `GET /api/openapi.json` 返回 OpenAPI 3 描述，`GET /api/docs` 返回 Swagger UI 页面。
//! 请求体的必填字段直接取自校验器，文档和校验不会各说各话。

use axum::response::Html;
use axum::Json;
use serde_json::{json, Map, Value};

use crate::api::validator::{HTML_FIELDS, REQUIRED_FIELDS};
use crate::models::DocumentType;

pub const OPENAPI_PATH: &str = "/api/openapi.json";
pub const DOCS_PATH: &str = "/api/docs";

const TITLE: &str = "Document Generation API";

fn field_description(field: &str) -> &'static str {
    match field {
        "content_html" => "HTML content for the body",
        "header_html" => "HTML content for the header",
        "footer_html" => "HTML content for the footer (last page only)",
        _ => "",
    }
}

fn document_schema() -> Value {
    let mut properties = Map::new();
    for field in HTML_FIELDS {
        properties.insert(
            field.to_string(),
            json!({ "type": "string", "description": field_description(field) }),
        );
    }
    properties.insert(
        "document_type".to_string(),
        json!({
            "type": "string",
            "description": "Document type (pdf or docx)",
            "enum": [DocumentType::Pdf.extension(), DocumentType::Docx.extension()],
        }),
    );
    properties.insert(
        "watermark".to_string(),
        json!({
            "type": "string",
            "nullable": true,
            "description": "Watermark text (markup is stripped)",
        }),
    );

    json!({
        "type": "object",
        "required": REQUIRED_FIELDS,
        "properties": properties,
    })
}

fn generate_operation() -> Value {
    let error = json!({
        "application/json": { "schema": { "$ref": "#/components/schemas/Error" } }
    });
    json!({
        "summary": "Generate a document (PDF or DOCX) from HTML content",
        "requestBody": {
            "required": true,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Document" } }
            }
        },
        "responses": {
            "200": {
                "description": "Success - Returns document file",
                "content": {
                    (DocumentType::Pdf.mime_type()): {
                        "schema": { "type": "string", "format": "binary" }
                    },
                    (DocumentType::Docx.mime_type()): {
                        "schema": { "type": "string", "format": "binary" }
                    }
                }
            },
            "400": { "description": "Validation Error", "content": error.clone() },
            "413": { "description": "Request body too large", "content": error.clone() },
            "500": { "description": "Internal Server Error", "content": error }
        }
    })
}

/// OpenAPI 3 文档
pub fn openapi_document() -> Value {
    let generate = generate_operation();
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": TITLE,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "API for generating PDF and DOCX documents from HTML",
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Health check",
                    "responses": { "200": { "description": "Service is healthy" } }
                }
            },
            "/generate": { "post": generate.clone() },
            "/api/v1/generate": { "post": generate },
        },
        "components": {
            "schemas": {
                "Document": document_schema(),
                "Error": {
                    "type": "object",
                    "required": ["error"],
                    "properties": { "error": { "type": "string" } }
                }
            }
        }
    })
}

pub async fn openapi_json() -> Json<Value> {
    Json(openapi_document())
}

pub async fn docs_page() -> Html<String> {
    Html(format!(
        r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => SwaggerUIBundle({{ url: "{spec}", dom_id: "#swagger-ui" }});
  </script>
</body>
</html>"##,
        title = TITLE,
        spec = OPENAPI_PATH,
    ))
}
