//! # dos 子命令 CLI 定义
//!
//! 解析 DosMain 写出的态密度表，导出 CSV 并绘图。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/dos.rs`

use clap::Args;
use std::path::PathBuf;

/// dos 子命令参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// DOS table written by DosMain (e.g., aiida.DOS.Tetrahedron)
    pub file: PathBuf,

    /// Export the table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Plot the DOS to this file
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Generate SVG instead of PNG
    #[arg(long, default_value_t = false)]
    pub svg: bool,

    /// Plot title (defaults to the file name)
    #[arg(long)]
    pub title: Option<String>,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 700)]
    pub height: u32,
}
