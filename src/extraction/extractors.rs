//! 按文件类型提取文本
//!
//! 格式层面的问题一律降级为占位文本，不算提取失败。

use tracing::{debug, warn};

use super::pdf::scan_pdf_text;
use crate::models::FileType;

pub const TEXT_DECODE_PLACEHOLDER: &str =
    "[Text file could not be decoded as UTF-8; content unavailable]";

pub const PDF_LIMITED_PLACEHOLDER: &str = "[PDF document: limited text extraction. \
The content may be compressed, scanned or image-based, so no readable text was found]";

pub const PDF_ERROR_PLACEHOLDER: &str =
    "[PDF document: text extraction error. The file may be encrypted or corrupted]";

pub const IMAGE_PLACEHOLDER: &str =
    "[Image file: visual content analysis is not available. Consider the file name and context]";

/// 提取文本
///
/// # 参数
/// - `file_type`: 由扩展名得到的类型
/// - `file_name`: 文件名（用于占位文本）
/// - `bytes`: 文件内容
///
/// # 返回
/// 返回提取出的文本或占位文本，永不失败
pub fn extract_content(file_type: FileType, file_name: &str, bytes: &[u8]) -> String {
    match file_type {
        FileType::Text | FileType::Csv | FileType::Json | FileType::Xml => {
            extract_text(file_name, bytes)
        }
        FileType::Pdf => extract_pdf(file_name, bytes),
        FileType::Image => IMAGE_PLACEHOLDER.to_string(),
        office if office.is_office() => office_placeholder(office, file_name),
        _ => unknown_placeholder(file_type),
    }
}

/// 文本类文件：按 UTF-8 解码并去掉首尾空白
pub fn extract_text(file_name: &str, bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').trim().to_string(),
        Err(e) => {
            warn!("⚠️ 文件 {} 不是合法的 UTF-8: {}", file_name, e);
            TEXT_DECODE_PLACEHOLDER.to_string()
        }
    }
}

/// PDF：字节扫描，失败时返回占位文本
pub fn extract_pdf(file_name: &str, bytes: &[u8]) -> String {
    match scan_pdf_text(bytes) {
        Ok(text) if !text.is_empty() => {
            debug!("PDF {} 提取到 {} 个字符", file_name, text.chars().count());
            text
        }
        Ok(_) => {
            debug!("PDF {} 未找到可读文本", file_name);
            PDF_LIMITED_PLACEHOLDER.to_string()
        }
        Err(e) => {
            warn!("⚠️ PDF {} 扫描失败: {}", file_name, e);
            PDF_ERROR_PLACEHOLDER.to_string()
        }
    }
}

/// Word / Excel：不解析，返回说明文字
pub fn office_placeholder(file_type: FileType, file_name: &str) -> String {
    let kind = match file_type {
        FileType::Doc | FileType::Docx => "Word document",
        FileType::Xls | FileType::Xlsx => "Excel spreadsheet",
        _ => "Office document",
    };
    format!(
        "[{} \"{}\" ({}): structured content extraction is not supported for this format. \
         Evaluate it based on its name and the project context]",
        kind, file_name, file_type
    )
}

fn unknown_placeholder(file_type: FileType) -> String {
    format!(
        "[File of type '{}': content extraction is not supported]",
        file_type
    )
}
