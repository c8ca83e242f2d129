//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `write`: 准备 OpenMX 作业目录
//! - `dosmain`: 准备 DosMain 后处理作业目录
//! - `parse`: 解析单次 OpenMX 输出
//! - `dos`: 解析 DosMain 输出的态密度表并导出/绘图
//! - `collect`: 并行解析目录下的所有 OpenMX 输出并按总能排序
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: write, dosmain, parse, dos, collect

pub mod collect;
pub mod dos;
pub mod dosmain;
pub mod parse;
pub mod write;

use clap::{Parser, Subcommand};

/// omxutil - OpenMX 计算辅助工具
#[derive(Parser)]
#[command(name = "omxutil")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "OpenMX input rendering, output parsing and DOS post-processing", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Prepare an OpenMX job folder from a JSON calculation request
    Write(write::WriteArgs),

    /// Prepare a DosMain post-processing job folder
    Dosmain(dosmain::DosmainArgs),

    /// Parse the stdout of one OpenMX run
    Parse(parse::ParseArgs),

    /// Parse a DosMain DOS table, export CSV and plot it
    Dos(dos::DosArgs),

    /// Parse every OpenMX run below a directory and rank by total energy
    Collect(collect::CollectArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommand() {
        let cli = Cli::try_parse_from(["omxutil", "parse", "run1", "--md-type", "opt"]).unwrap();
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.path.to_str(), Some("run1"));
                assert_eq!(args.md_type, "opt");
                assert!(args.json.is_none());
            }
            _ => panic!("expected parse"),
        }
    }
}
