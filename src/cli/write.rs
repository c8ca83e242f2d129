//! # write 子命令 CLI 定义
//!
//! 从 JSON 计算请求生成 OpenMX 作业目录。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/write.rs`

use clap::Args;
use std::path::PathBuf;

/// write 子命令参数
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// JSON calculation request (structure, kpoints, parameters, pseudos, orbitals)
    pub request: PathBuf,

    /// Job folder to create
    #[arg(short, long, default_value = "openmx_job")]
    pub output: PathBuf,

    /// Reuse the job folder if it already exists
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Only render the input file to stdout, do not create the job folder
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
