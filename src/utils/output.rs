//! # 美化输出工具
//!
//! 统一的终端输出样式。库代码的诊断信息走 `log`，这里只负责面向用户的结果。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块与 `main.rs` 使用
//! - 使用 `error.rs` 的 ExitCode
//! - 使用 `colored` crate

use crate::error::ExitCode;

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印跳过消息
pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印写出文件消息，如 `[OK] input -> job/aiida.in`
pub fn print_written(what: &str, path: &str) {
    println!(
        "{} {} {} {}",
        "[OK]".green().bold(),
        what.dimmed(),
        "->".cyan(),
        path
    );
}

/// 打印宿主框架退出码
///
/// 作业本身失败（如被中断）用黄色，文件访问类问题用红色。
pub fn print_exit_code(code: &ExitCode) {
    let tag = format!("[EXIT {}]", code.status());
    let tag = if code.is_job_failure() {
        tag.yellow().bold()
    } else {
        tag.red().bold()
    };
    eprintln!("{} {} {}", tag, code.label().dimmed(), code);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}
