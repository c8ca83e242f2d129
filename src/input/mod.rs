//! # OpenMX 输入模块
//!
//! 把计算请求校验并渲染为 OpenMX 输入文件。
//!
//! ## 子模块
//! - `keywords`: 关键字注册表
//! - `dict`: 字典键归一化
//! - `settings`: 作业设置
//! - `validate`: 请求校验
//! - `writer`: 输入文本渲染
//!
//! ## 依赖关系
//! - 被 `calculations/`, `commands/write.rs` 使用
//! - 使用 `models/`

pub mod dict;
pub mod keywords;
pub mod settings;
pub mod validate;
pub mod writer;

pub use settings::Settings;
pub use validate::validate_request;
pub use writer::{render_input, RenderedInput, SYSTEM_NAME};
