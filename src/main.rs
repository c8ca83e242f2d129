//! # omxutil - OpenMX 计算辅助工具
//!
//! ## 子命令
//! - `write`   - 由 JSON 请求准备 OpenMX 作业目录
//! - `dosmain` - 准备 DosMain 后处理作业目录
//! - `parse`   - 解析单次 OpenMX 输出
//! - `dos`     - 导出/绘制 DosMain 态密度
//! - `collect` - 并行解析并按总能排序
//!
//! 日志级别由 `RUST_LOG` 控制，默认 `warn`。

use clap::Parser;
use omxutil::cli::Cli;
use omxutil::{commands, utils};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
