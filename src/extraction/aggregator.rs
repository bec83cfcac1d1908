//! 批量提取与渲染
//!
//! 一批文件并发读取和提取，单个文件失败只记录在它自己的 FileContent 中。

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::classifier::classify;
use super::extractors::extract_content;
use crate::infrastructure::StorageReader;
use crate::models::{FileContent, FileRef};

/// 单个文件在 prompt 中的默认最大字符数
pub const DEFAULT_FILE_CONTENT_CAP: usize = 4000;

pub const CONTENT_HEADER: &str = "=== CONTENT OF ATTACHED FILES ===";
pub const CONTENT_FOOTER: &str = "=== END OF ATTACHED FILES ===";
pub const EMPTY_CONTENT_MARKER: &str = "[empty or non-extractable]";

/// 读取并提取单个文件
pub async fn extract_file(storage: &dyn StorageReader, file: &FileRef) -> FileContent {
    let file_type = classify(&file.name);

    match storage.read(file).await {
        Ok(bytes) => {
            let content = extract_content(file_type, &file.name, &bytes);
            debug!(
                "✓ {} ({}) 提取完成: {} 字节 -> {} 字符",
                file.name,
                file_type,
                bytes.len(),
                content.chars().count()
            );
            FileContent::extracted(&file.name, file_type, content)
        }
        Err(e) => {
            warn!("⚠️ 读取文件 {} 失败: {}", file.name, e);
            FileContent::failed(&file.name, file_type, e.to_string())
        }
    }
}

/// 并发提取一批文件，结果顺序与输入一致
pub async fn extract_files(storage: &dyn StorageReader, files: &[FileRef]) -> Vec<FileContent> {
    if files.is_empty() {
        return Vec::new();
    }

    info!("📎 开始提取 {} 个附件...", files.len());

    let contents = join_all(files.iter().map(|file| extract_file(storage, file))).await;

    let failed = contents.iter().filter(|c| !c.extracted_successfully).count();
    info!(
        "✓ 附件提取完成: 成功 {}/{}",
        contents.len() - failed,
        contents.len()
    );

    contents
}

/// 渲染为 prompt 中的文本块，列表为空时返回空字符串
///
/// # 参数
/// - `contents`: 提取结果
/// - `cap`: 单个文件的最大字符数
pub fn render_file_contents(contents: &[FileContent], cap: usize) -> String {
    if contents.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    block.push_str(CONTENT_HEADER);
    block.push_str("\n\n");

    for (idx, file) in contents.iter().enumerate() {
        block.push_str(&format!(
            "--- FILE {}: {} (type: {}) ---\n",
            idx + 1,
            file.file_name,
            file.file_type
        ));

        let body = file.content.trim();
        if body.is_empty() {
            block.push_str(EMPTY_CONTENT_MARKER);
            block.push('\n');
        } else {
            block.push_str(&truncate_content(body, cap));
            block.push('\n');
        }

        if let Some(error) = &file.error {
            block.push_str(&format!("[extraction failed: {}]\n", error));
        }
        block.push('\n');
    }

    block.push_str(CONTENT_FOOTER);
    block.push('\n');
    block
}

/// 按字符截断，超出时追加原始长度说明
pub fn truncate_content(text: &str, cap: usize) -> String {
    let total = text.chars().count();
    if total <= cap {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(cap).collect();
    truncated.push_str(&format!(
        "\n[... content truncated, original length: {} characters]",
        total
    ));
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStorage;
    use crate::models::FileType;

    #[test]
    fn test_render_empty_list() {
        assert_eq!(render_file_contents(&[], DEFAULT_FILE_CONTENT_CAP), "");
    }

    #[test]
    fn test_render_sections() {
        let contents = vec![
            FileContent::extracted("a.txt", FileType::Text, "alpha".to_string()),
            FileContent::extracted("b.pdf", FileType::Pdf, String::new()),
            FileContent::failed("c.csv", FileType::Csv, "文件不存在: c.csv"),
        ];

        let block = render_file_contents(&contents, DEFAULT_FILE_CONTENT_CAP);

        assert!(block.starts_with(CONTENT_HEADER));
        assert!(block.trim_end().ends_with(CONTENT_FOOTER));
        assert!(block.contains("--- FILE 1: a.txt (type: text) ---\nalpha\n"));
        assert!(block.contains("--- FILE 2: b.pdf (type: pdf) ---\n[empty or non-extractable]"));
        assert!(block.contains("--- FILE 3: c.csv (type: csv) ---"));
        assert!(block.contains("[extraction failed: 文件不存在: c.csv]"));
    }

    #[test]
    fn test_truncation_marker() {
        let long = "x".repeat(4500);
        let truncated = truncate_content(&long, 4000);

        assert!(truncated.starts_with(&"x".repeat(4000)));
        assert!(!truncated.starts_with(&"x".repeat(4001)));
        assert!(truncated.ends_with("original length: 4500 characters]"));

        assert_eq!(truncate_content("short", 4000), "short");
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(truncate_content(&text, 10), text);
        assert!(truncate_content(&text, 5).starts_with("ééééé\n"));
    }

    #[tokio::test]
    async fn test_extract_files_keeps_order_and_failures() {
        let storage = MemoryStorage::new()
            .with_file("1", "first")
            .with_file("3", "(Hello) (World)");
        let files = vec![
            FileRef::new("1", "one.txt"),
            FileRef::new("2", "two.txt"),
            FileRef::new("3", "three.pdf"),
        ];

        let contents = extract_files(&storage, &files).await;

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].content, "first");
        assert!(!contents[1].extracted_successfully);
        assert!(contents[1].error.is_some());
        assert_eq!(contents[2].content, "Hello World");
    }
}
