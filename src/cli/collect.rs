//! # collect 子命令 CLI 定义
//!
//! 并行解析根目录下的所有 OpenMX 输出并按总能排序。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 排序依据
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RankBy {
    /// Total energy Utot
    Total,
    /// Total energy divided by the number of atoms
    PerAtom,
}

/// collect 子命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Root directory containing OpenMX run folders
    pub root: PathBuf,

    /// Stdout filename pattern (glob, comma-separated for several)
    #[arg(long, env = "OMX_PATTERN", default_value = "aiida.out")]
    pub pattern: String,

    /// Only look at files directly under the root
    #[arg(long, default_value_t = false)]
    pub no_recursive: bool,

    /// Number of parallel jobs (0 = all CPUs)
    #[arg(short, long, env = "OMX_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Ranking criterion
    #[arg(long, value_enum, default_value_t = RankBy::Total)]
    pub rank_by: RankBy,

    /// Number of top runs to print
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Filename for the full ranking CSV
    #[arg(long, default_value = "openmx_ranking.csv")]
    pub output_csv: PathBuf,
}
