//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `calculations/`, `parsers/`, `dos/`, `batch/`, `utils/`
//! - 子模块: write, dosmain, parse, dos, collect

pub mod collect;
pub mod dos;
pub mod dosmain;
pub mod parse;
pub mod write;

use crate::cli::Commands;
use crate::error::{OmxError, Result};

use std::fs;
use std::path::Path;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Write(args) => write::execute(args),
        Commands::Dosmain(args) => dosmain::execute(args),
        Commands::Parse(args) => parse::execute(args),
        Commands::Dos(args) => dos::execute(args),
        Commands::Collect(args) => collect::execute(args),
    }
}

/// 作业目录的描述文件名
pub const CALCINFO_FILE: &str = "calcinfo.json";

/// 创建作业目录
///
/// 目录已存在且非空时，需要 `overwrite` 才继续使用。
pub(crate) fn create_job_folder(folder: &Path, overwrite: bool) -> Result<()> {
    if folder.exists() {
        let non_empty = fs::read_dir(folder)
            .map_err(|e| OmxError::FileReadError {
                path: folder.display().to_string(),
                source: e,
            })?
            .next()
            .is_some();
        if non_empty && !overwrite {
            return Err(OmxError::InvalidArgument(format!(
                "job folder '{}' is not empty (use --overwrite to reuse it)",
                folder.display()
            )));
        }
        return Ok(());
    }

    fs::create_dir_all(folder).map_err(|e| OmxError::FileWriteError {
        path: folder.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_job_folder() {
        let root = std::env::temp_dir().join(format!("omxutil_jobdir_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);

        create_job_folder(&root, false).unwrap();
        assert!(root.is_dir());
        // 空目录可直接复用
        create_job_folder(&root, false).unwrap();

        fs::write(root.join("aiida.in"), "").unwrap();
        assert!(create_job_folder(&root, false).is_err());
        create_job_folder(&root, true).unwrap();

        fs::remove_dir_all(&root).unwrap();
    }
}
