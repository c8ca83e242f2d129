//! # dosmain 子命令 CLI 定义
//!
//! 为已完成的 OpenMX 计算准备 DosMain 后处理作业目录。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/dosmain.rs`

use crate::calculations::{DosMethod, DosType};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// DOS 类型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DosTypeArg {
    /// Total density of states
    Dos,
    /// Projected density of states
    Pdos,
}

impl From<DosTypeArg> for DosType {
    fn from(arg: DosTypeArg) -> Self {
        match arg {
            DosTypeArg::Dos => DosType::Dos,
            DosTypeArg::Pdos => DosType::Pdos,
        }
    }
}

/// DOS 构造方法
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DosMethodArg {
    /// Tetrahedron method
    Tetrahedron,
    /// Gaussian broadening
    Gaussian,
}

impl From<DosMethodArg> for DosMethod {
    fn from(arg: DosMethodArg) -> Self {
        match arg {
            DosMethodArg::Tetrahedron => DosMethod::Tetrahedron,
            DosMethodArg::Gaussian => DosMethod::Gaussian,
        }
    }
}

/// dosmain 子命令参数
#[derive(Args, Debug)]
pub struct DosmainArgs {
    /// Working directory of the finished OpenMX run (holds aiida.Dos.val/vec)
    #[arg(long)]
    pub openmx_dir: PathBuf,

    /// JSON request of the OpenMX run (structure and orbitals, needed for PDOS)
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Job folder to create
    #[arg(short, long, default_value = "dosmain_job")]
    pub output: PathBuf,

    /// Computer label recorded for the remote folder
    #[arg(long, default_value = "localhost")]
    pub computer: String,

    /// Total DOS or projected DOS
    #[arg(long = "type", value_enum, default_value_t = DosTypeArg::Dos)]
    pub dos_type: DosTypeArg,

    /// DOS construction method
    #[arg(long, value_enum, default_value_t = DosMethodArg::Tetrahedron)]
    pub method: DosMethodArg,

    /// Gaussian broadening in eV (gaussian method only)
    #[arg(long)]
    pub broadening: Option<f64>,

    /// Comma-separated 1-based atom indices for PDOS (e.g., '1,2')
    #[arg(long, value_delimiter = ',')]
    pub atoms: Vec<usize>,
}
