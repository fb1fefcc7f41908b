pub mod element;
pub mod request;
pub mod watermark;

pub use element::{HtmlFragment, ParsedElement, ParsedFragment};
pub use request::{DocumentInput, DocumentType, GeneratedFile, GenerationRequest};
pub use watermark::WatermarkSpec;
