//! 文件类型识别：根据扩展名返回类型标签

use phf::phf_map;

use crate::models::FileType;

static EXTENSION_TYPES: phf::Map<&'static str, FileType> = phf_map! {
    "txt" => FileType::Text,
    "md" => FileType::Text,
    "markdown" => FileType::Text,
    "log" => FileType::Text,
    "csv" => FileType::Csv,
    "tsv" => FileType::Csv,
    "json" => FileType::Json,
    "xml" => FileType::Xml,
    "pdf" => FileType::Pdf,
    "doc" => FileType::Doc,
    "docx" => FileType::Docx,
    "xls" => FileType::Xls,
    "xlsx" => FileType::Xlsx,
    "png" => FileType::Image,
    "jpg" => FileType::Image,
    "jpeg" => FileType::Image,
    "gif" => FileType::Image,
    "bmp" => FileType::Image,
    "webp" => FileType::Image,
    "svg" => FileType::Image,
    "tif" => FileType::Image,
    "tiff" => FileType::Image,
};

/// 根据文件名判断类型，没有扩展名或扩展名未知时返回 `Unknown`
pub fn classify(file_name: &str) -> FileType {
    let Some((stem, extension)) = file_name.trim().rsplit_once('.') else {
        return FileType::Unknown;
    };

    // ".env" 这类隐藏文件没有扩展名
    if stem.is_empty() || stem.ends_with('/') || stem.ends_with('\\') {
        return FileType::Unknown;
    }

    EXTENSION_TYPES
        .get(extension.to_lowercase().as_str())
        .copied()
        .unwrap_or(FileType::Unknown)
}
