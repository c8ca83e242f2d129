//! # 解析器模块
//!
//! 解析宿主框架取回的计算输出。
//!
//! ## 依赖关系
//! - 被 `workflows/`, `commands/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: openmx_out, dos

pub mod dos;
pub mod openmx_out;

pub use dos::{parse_dos_table, DosTable, DosmainParsed, DosmainParser};
pub use openmx_out::{parse_stdout, OpenmxParsed, OpenmxParser};

use crate::error::{OmxError, Result};

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 取回的输出文件夹
///
/// 对应宿主框架的 `retrieved` 节点，只提供列举与读取。
pub trait RetrievedFolder {
    /// 文件夹中的文件名
    fn list_object_names(&self) -> io::Result<Vec<String>>;

    /// 读取文件全文
    fn read_to_string(&self, name: &str) -> io::Result<String>;
}

/// 本地目录
#[derive(Debug, Clone)]
pub struct DirFolder {
    root: PathBuf,
}

impl DirFolder {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(OmxError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(DirFolder {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RetrievedFolder for DirFolder {
    fn list_object_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_to_string(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(name))
    }
}

/// 内存中的文件夹
#[derive(Debug, Clone, Default)]
pub struct MemoryFolder {
    files: BTreeMap<String, String>,
}

impl MemoryFolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }
}

impl RetrievedFolder for MemoryFolder {
    fn list_object_names(&self) -> io::Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read_to_string(&self, name: &str) -> io::Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
    }
}

/// 提取等号后的第一个数值
pub(crate) fn extract_value_after_eq(s: &str) -> Option<f64> {
    let pos = s.find('=')?;
    s[pos + 1..].split_whitespace().next()?.parse().ok()
}
