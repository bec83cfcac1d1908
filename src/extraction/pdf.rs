//! PDF 文本扫描器
//!
//! 不引入完整的 PDF 解析器，只在字节层面扫描 `( ... )` 字符串字面量，
//! 作为 prompt 中的内容预览。压缩流（FlateDecode）中的文本不可见。
//!
//! 规则：
//! - `(` 开始一个字面量，扫描到配对的、未转义的 `)`
//! - 字面量内部平衡的括号属于内容本身
//! - 支持 `\n \r \t \b \f \( \) \\`、八进制 `\ddd` 以及行尾续行
//! - 最后一个未闭合的字面量直接丢弃
//! - 含 `/Encrypt` 的文档或嵌套过深视为扫描失败

use thiserror::Error;

/// 允许的最大括号嵌套深度
pub const MAX_NESTING_DEPTH: usize = 64;

/// 扫描失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PdfScanError {
    #[error("文档已加密")]
    Encrypted,
    #[error("字符串嵌套过深 (偏移: {offset})")]
    NestingTooDeep { offset: usize },
}

/// 扫描字节流，按文档顺序返回所有非空字符串字面量
pub fn scan_pdf_literals(bytes: &[u8]) -> Result<Vec<String>, PdfScanError> {
    if contains(bytes, b"/Encrypt") {
        return Err(PdfScanError::Encrypted);
    }

    let mut literals = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'(' {
            pos += 1;
            continue;
        }

        match read_literal(bytes, pos + 1)? {
            Some((raw, next)) => {
                let text = decode_literal(&raw);
                if !text.is_empty() {
                    literals.push(text);
                }
                pos = next;
            }
            // 未闭合，后面不可能再有完整的字面量
            None => break,
        }
    }

    Ok(literals)
}

/// 扫描并拼接为一段文本，字面量之间用空格分隔
pub fn scan_pdf_text(bytes: &[u8]) -> Result<String, PdfScanError> {
    Ok(scan_pdf_literals(bytes)?.join(" "))
}

/// 从 `start`（`(` 之后的位置）读取一个字面量
///
/// 返回 (转义后的字节, 结束括号之后的位置)，未闭合时返回 None
fn read_literal(bytes: &[u8], start: usize) -> Result<Option<(Vec<u8>, usize)>, PdfScanError> {
    let mut out = Vec::new();
    let mut depth = 1usize;
    let mut pos = start;

    while pos < bytes.len() {
        let byte = bytes[pos];
        match byte {
            b'\\' => {
                pos += 1;
                let Some(&escaped) = bytes.get(pos) else {
                    return Ok(None);
                };
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'(' | b')' | b'\\' => out.push(escaped),
                    // 续行
                    b'\r' => {
                        if bytes.get(pos + 1) == Some(&b'\n') {
                            pos += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while digits < 3 {
                            match bytes.get(pos) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    digits += 1;
                                    pos += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xFF) as u8);
                        // 循环末尾会再 +1
                        pos -= 1;
                    }
                    other => out.push(other),
                }
            }
            b'(' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(PdfScanError::NestingTooDeep { offset: pos });
                }
                out.push(byte);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some((out, pos + 1)));
                }
                out.push(byte);
            }
            _ => out.push(byte),
        }
        pos += 1;
    }

    Ok(None)
}

/// 字节转文本：UTF-16BE（带 BOM）、UTF-8，否则按 Latin-1
fn decode_literal(raw: &[u8]) -> String {
    let text: String = if raw.len() >= 2 && raw[0] == 0xFE && raw[1] == 0xFF {
        let units = raw[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else {
        match std::str::from_utf8(raw) {
            Ok(s) => s.to_string(),
            Err(_) => raw.iter().map(|&b| b as char).collect(),
        }
    };

    text.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world_in_order() {
        let bytes = b"%PDF-1.4\nBT /F1 12 Tf (Hello) Tj (World) Tj ET";
        let text = scan_pdf_text(bytes).unwrap();
        assert_eq!(text, "Hello World");
    }

    #[test]
    fn test_no_literals() {
        let bytes = b"%PDF-1.7\n1 0 obj << /Length 0 >> stream\nendstream";
        assert!(scan_pdf_literals(bytes).unwrap().is_empty());
        assert!(scan_pdf_literals(b"").unwrap().is_empty());
    }

    #[test]
    fn test_escaped_parentheses() {
        let bytes = br"(a \(b\) c)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "a (b) c");
    }

    #[test]
    fn test_balanced_nested_parentheses() {
        let bytes = b"(outer (inner) tail) (next)";
        assert_eq!(
            scan_pdf_literals(bytes).unwrap(),
            vec!["outer (inner) tail".to_string(), "next".to_string()]
        );
    }

    #[test]
    fn test_escaped_backslash_before_close() {
        // "\\" 是转义后的反斜杠，随后的 ")" 正常闭合
        let bytes = br"(path C:\\) (after)";
        assert_eq!(
            scan_pdf_literals(bytes).unwrap(),
            vec![r"path C:\".to_string(), "after".to_string()]
        );
    }

    #[test]
    fn test_unterminated_literal_is_dropped() {
        let bytes = b"(kept) (never closed";
        assert_eq!(scan_pdf_literals(bytes).unwrap(), vec!["kept".to_string()]);

        let dangling_escape = b"(kept) (oops \\";
        assert_eq!(
            scan_pdf_literals(dangling_escape).unwrap(),
            vec!["kept".to_string()]
        );
    }

    #[test]
    fn test_unterminated_nested_run() {
        let bytes = b"(a (b (c)";
        assert!(scan_pdf_literals(bytes).unwrap().is_empty());
    }

    #[test]
    fn test_octal_escapes() {
        // \101 = 'A', \60 = '0'
        let bytes = br"(\101BC \60)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "ABC 0");
    }

    #[test]
    fn test_octal_followed_by_digit() {
        // 最多三位：\1012 = 'A' + '2'
        let bytes = br"(\1012)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "A2");
    }

    #[test]
    fn test_whitespace_escapes_and_line_continuation() {
        let bytes = b"(line one\\nline two) (split \\\nword)";
        assert_eq!(
            scan_pdf_literals(bytes).unwrap(),
            vec!["line one line two".to_string(), "split word".to_string()]
        );
    }

    #[test]
    fn test_crlf_line_continuation() {
        let bytes = b"(con\\\r\ntinued)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "continued");
    }

    #[test]
    fn test_unknown_escape_kept_literally() {
        let bytes = br"(\q)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "q");
    }

    #[test]
    fn test_blank_literals_skipped() {
        let bytes = b"( ) (\\n) (text)";
        assert_eq!(scan_pdf_literals(bytes).unwrap(), vec!["text".to_string()]);
    }

    #[test]
    fn test_latin1_fallback() {
        // 0xE9 单独出现不是合法 UTF-8，按 Latin-1 解码为 'é'
        let bytes = b"(caf\xE9)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "café");
    }

    #[test]
    fn test_utf8_literal() {
        let bytes = "(résumé)".as_bytes();
        assert_eq!(scan_pdf_text(bytes).unwrap(), "résumé");
    }

    #[test]
    fn test_utf16_be_with_bom() {
        let bytes = b"(\xFE\xFF\x00H\x00i)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "Hi");
    }

    #[test]
    fn test_encrypted_document() {
        let bytes = b"%PDF-1.6\ntrailer << /Encrypt 5 0 R >> (Hello)";
        assert_eq!(scan_pdf_literals(bytes), Err(PdfScanError::Encrypted));
    }

    #[test]
    fn test_nesting_too_deep() {
        let mut bytes = vec![b'('; MAX_NESTING_DEPTH + 1];
        bytes.extend(vec![b')'; MAX_NESTING_DEPTH + 1]);
        assert!(matches!(
            scan_pdf_literals(&bytes),
            Err(PdfScanError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_nesting_at_limit_is_fine() {
        let mut bytes = vec![b'('; MAX_NESTING_DEPTH];
        bytes.push(b'x');
        bytes.extend(vec![b')'; MAX_NESTING_DEPTH]);
        let literals = scan_pdf_literals(&bytes).unwrap();
        assert_eq!(literals.len(), 1);
        assert!(literals[0].contains('x'));
    }

    #[test]
    fn test_stray_close_paren_ignored() {
        let bytes = b") ) (ok)";
        assert_eq!(scan_pdf_text(bytes).unwrap(), "ok");
    }
}
