//! # 计算作业准备模块
//!
//! 对应宿主框架的 `CalcJob` 约定：把输入写入临时文件夹，并返回 `CalcInfo`
//! 描述要拷贝的本地文件、远程符号链接、执行命令与要取回的文件。
//! 本模块不执行任何外部程序。
//!
//! ## 子模块
//! - `openmx`: OpenMX 主程序作业
//! - `dosmain`: DosMain 后处理作业
//!
//! ## 依赖关系
//! - 被 `workflows/`, `commands/write.rs`, `commands/dosmain.rs` 使用
//! - 使用 `input/`, `models/`

pub mod dosmain;
pub mod openmx;

pub use dosmain::{DosMethod, DosType, DosmainCalculation, DosmainInputs};
pub use openmx::OpenmxCalculation;

use crate::error::{OmxError, Result};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 单个可执行程序的调用描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInfo {
    pub cmdline_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin_name: Option<String>,
    pub stdout_name: String,
    pub with_mpi: bool,
}

/// 从本地拷贝到作业目录的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCopy {
    pub source: PathBuf,
    /// 作业目录内的相对路径
    pub target: String,
}

/// 已完成计算留在远程机器上的工作目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub computer: String,
    pub path: PathBuf,
}

/// 远程符号链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLink {
    pub computer: String,
    pub source: PathBuf,
    pub target: String,
}

/// 作业准备结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcInfo {
    pub codes_info: Vec<CodeInfo>,
    pub local_copy_list: Vec<LocalCopy>,
    pub remote_symlink_list: Vec<RemoteLink>,
    pub retrieve_list: Vec<String>,
}

impl CalcInfo {
    /// 在本地执行 `local_copy_list`
    ///
    /// 宿主框架通常自行完成拷贝，命令行工具准备本地作业目录时使用。
    pub fn stage_local_copies(&self, folder: &Path) -> Result<usize> {
        for entry in &self.local_copy_list {
            let dest = folder.join(&entry.target);
            if !entry.source.exists() {
                return Err(OmxError::FileNotFound {
                    path: entry.source.display().to_string(),
                });
            }
            fs::copy(&entry.source, &dest).map_err(|e| OmxError::FileWriteError {
                path: dest.display().to_string(),
                source: e,
            })?;
        }
        Ok(self.local_copy_list.len())
    }

    /// 写出 `calcinfo.json`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| OmxError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// 在作业目录中写入文件
pub(crate) fn write_file(folder: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = folder.join(name);
    fs::write(&path, content).map_err(|e| OmxError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(path)
}

/// 确保子目录存在
pub(crate) fn create_subfolder(folder: &Path, name: &str) -> Result<PathBuf> {
    let path = folder.join(name);
    fs::create_dir_all(&path).map_err(|e| OmxError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(path)
}
