//! # DOS 数据导出与绘图模块
//!
//! ## 子模块
//! - `export`: CSV 导出
//! - `plot`: 使用 plotters 绘制态密度
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 调用
//! - 使用 `parsers/dos.rs`

pub mod export;
pub mod plot;

pub use export::to_csv;
pub use plot::generate_dos_plot;
