//! 内容提取流水线
//!
//! `classifier` 识别类型 → `extractors` 按类型提取 → `aggregator` 并发汇总并渲染

pub mod aggregator;
pub mod classifier;
pub mod extractors;
pub mod pdf;

pub use aggregator::{
    extract_file, extract_files, render_file_contents, truncate_content, DEFAULT_FILE_CONTENT_CAP,
};
pub use classifier::classify;
pub use extractors::extract_content;
pub use pdf::{scan_pdf_literals, scan_pdf_text, PdfScanError};
