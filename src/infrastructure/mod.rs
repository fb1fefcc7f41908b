//! 基础设施层：持有外部资源，只暴露能力

pub mod docx;
pub mod pdf_compose;
pub mod print_engine;
pub mod temp_files;

pub use pdf_compose::{page_count, stamp_on_last_page, StampSummary};
pub use print_engine::{ChromePrintEngine, PrintEngine, PrintJob, PrintOptions};
pub use temp_files::TempFileRegistry;
