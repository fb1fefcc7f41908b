pub mod document_service;
pub mod docx_service;
pub mod html_parser;
pub mod pdf_service;

pub use document_service::DocumentService;
pub use docx_service::DocxAssembler;
pub use pdf_service::PdfAssembler;
