//! # omxutil - OpenMX 计算辅助库
//!
//! 为 OpenMX 第一性原理程序提供宿主框架一侧的胶水代码：
//! 把计算请求渲染成 OpenMX 输入文件、解析标准输出与 DosMain 的态密度表、
//! 以及串联 OpenMX 与 DosMain 的 DOS 工作流。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── models/        (结构、请求、结果数据模型与单位)
//!   ├── input/         (关键字表、校验、输入文件渲染)
//!   ├── calculations/  (OpenMX / DosMain 作业准备)
//!   ├── parsers/       (标准输出与 DOS 表解析)
//!   ├── workflows/     (OpenMX -> DosMain 工作流)
//!   ├── dos/           (DOS 导出与绘图)
//!   ├── batch/         (批量并行解析)
//!   ├── cli/, commands/ (命令行)
//!   ├── utils/         (终端输出与进度条)
//!   └── error.rs       (错误与退出码)
//! ```

pub mod batch;
pub mod calculations;
pub mod cli;
pub mod commands;
pub mod dos;
pub mod error;
pub mod input;
pub mod models;
pub mod parsers;
pub mod utils;
pub mod workflows;

pub use error::{ExitCode, OmxError, Result};
