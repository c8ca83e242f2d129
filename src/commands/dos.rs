//! # dos 命令实现
//!
//! 解析 DosMain 写出的态密度表，打印概要，导出 CSV 并绘图。
//!
//! ## 依赖关系
//! - 使用 `cli/dos.rs` 定义的参数
//! - 使用 `parsers/dos.rs`, `dos/export.rs`, `dos/plot.rs`
//! - 使用 `utils/output.rs`

use crate::cli::dos::DosArgs;
use crate::dos::{generate_dos_plot, to_csv};
use crate::error::{OmxError, Result};
use crate::parsers::parse_dos_table;
use crate::utils::output;

use std::fs;

/// 执行 dos 命令
pub fn execute(args: DosArgs) -> Result<()> {
    output::print_header("Reading DOS Table");

    if !args.file.exists() {
        return Err(OmxError::FileNotFound {
            path: args.file.display().to_string(),
        });
    }

    let text = fs::read_to_string(&args.file).map_err(|e| OmxError::FileReadError {
        path: args.file.display().to_string(),
        source: e,
    })?;
    let table = parse_dos_table(&text)?;

    let energies = table.energies();
    let e_min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let e_max = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    output::print_info(&format!(
        "{} energy points from {:.3} to {:.3} eV, {} column(s){}",
        table.n_rows(),
        e_min,
        e_max,
        table.n_columns(),
        if table.is_spin_polarized() {
            ", spin polarized"
        } else {
            ""
        }
    ));

    if args.csv.is_none() && args.plot.is_none() {
        output::print_warning("Nothing to write; pass --csv and/or --plot");
        return Ok(());
    }

    if let Some(csv_path) = &args.csv {
        to_csv(&table, csv_path)?;
        output::print_written("csv", &csv_path.display().to_string());
    }

    if let Some(plot_path) = &args.plot {
        let title = args.title.clone().unwrap_or_else(|| {
            args.file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "DOS".to_string())
        });
        generate_dos_plot(&table, plot_path, &title, args.width, args.height, args.svg)?;
        output::print_written("plot", &plot_path.display().to_string());
    }

    Ok(())
}
