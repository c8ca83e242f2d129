//! # 工作流模块
//!
//! 把多个计算作业串联起来。作业的提交与等待由宿主框架完成，
//! 这里通过 `Launcher` trait 接入。
//!
//! ## 依赖关系
//! - 使用 `calculations/`, `parsers/`
//! - 子模块: dos

pub mod dos;

pub use dos::{CompletedCalc, DosWorkflow, DosWorkflowOutputs, DosmainOptions, Launcher};
