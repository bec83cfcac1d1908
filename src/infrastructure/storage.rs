//! 存储读取 - 基础设施层
//!
//! 只暴露"按 FileRef 读取字节"的能力，不认识文件类型，也不做提取。

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageReadError;
use crate::models::FileRef;

/// 存储读取能力
#[async_trait]
pub trait StorageReader: Send + Sync {
    /// 读取文件的原始字节
    async fn read(&self, file: &FileRef) -> Result<Vec<u8>, StorageReadError>;
}

/// 本地目录存储
///
/// `FileRef.path` 是相对于根目录的路径，不允许跳出根目录。
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageReadError> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if path.trim().is_empty() || escapes {
            return Err(StorageReadError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageReader for LocalStorage {
    async fn read(&self, file: &FileRef) -> Result<Vec<u8>, StorageReadError> {
        let full_path = self.resolve(&file.path)?;
        debug!("读取文件: {}", full_path.display());

        tokio::fs::read(&full_path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageReadError::NotFound {
                    path: file.path.clone(),
                }
            } else {
                StorageReadError::ReadFailed {
                    path: file.path.clone(),
                    source,
                }
            }
        })
    }
}

/// 内存存储，按 path 查找
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

#[async_trait]
impl StorageReader for MemoryStorage {
    async fn read(&self, file: &FileRef) -> Result<Vec<u8>, StorageReadError> {
        self.files
            .get(&file.path)
            .cloned()
            .ok_or_else(|| StorageReadError::NotFound {
                path: file.path.clone(),
            })
    }
}
