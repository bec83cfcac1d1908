//! 文件相关数据结构

use serde::{Deserialize, Serialize};

/// 存储中的一个文件引用（由调用方持有，只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// 存储路径
    pub path: String,
    /// 原始文件名
    pub name: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// 文件语义类型（由扩展名推断）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Csv,
    Json,
    Xml,
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Image,
    Unknown,
}

impl FileType {
    /// 类型标签
    pub fn tag(self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Xml => "xml",
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Docx => "docx",
            FileType::Xls => "xls",
            FileType::Xlsx => "xlsx",
            FileType::Image => "image",
            FileType::Unknown => "unknown",
        }
    }

    /// 是否为 Office 二进制格式
    pub fn is_office(self) -> bool {
        matches!(
            self,
            FileType::Doc | FileType::Docx | FileType::Xls | FileType::Xlsx
        )
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// 单个文件的提取结果
///
/// 每次评估时新建，组装完 prompt 后即丢弃。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub file_name: String,
    pub file_type: FileType,
    pub content: String,
    pub extracted_successfully: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileContent {
    /// 提取成功（包括占位文本）
    pub fn extracted(file_name: impl Into<String>, file_type: FileType, content: String) -> Self {
        Self {
            file_name: file_name.into(),
            file_type,
            content,
            extracted_successfully: true,
            error: None,
        }
    }

    /// 读取文件失败
    pub fn failed(file_name: impl Into<String>, file_type: FileType, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type,
            content: String::new(),
            extracted_successfully: false,
            error: Some(error.into()),
        }
    }
}
