//! # parse 子命令 CLI 定义
//!
//! 解析单次 OpenMX 计算的标准输出。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use clap::Args;
use std::path::PathBuf;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Retrieved folder or the stdout file itself
    pub path: PathBuf,

    /// Stdout filename inside the folder
    #[arg(long, default_value = "aiida.out")]
    pub output_filename: String,

    /// MD.Type of the run; anything other than 'nomd' yields a final structure
    #[arg(long, default_value = "nomd")]
    pub md_type: String,

    /// Write the output parameters dictionary to this JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,
}
