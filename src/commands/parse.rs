//! # parse 命令实现
//!
//! 解析单次 OpenMX 计算的标准输出，打印摘要表，可选写出输出参数 JSON。
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `parsers/openmx_out.rs`
//! - 使用 `utils/output.rs`

use crate::cli::parse::ParseArgs;
use crate::error::{OmxError, Result};
use crate::models::units::{DIPOLE_UNITS, ENERGY_UNITS, FORCE_UNITS, TIME_UNITS};
use crate::models::OpenmxOutput;
use crate::parsers::{DirFolder, OpenmxParser};
use crate::utils::output;

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};

/// 摘要表行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Quantity")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Units")]
    units: String,
}

impl SummaryRow {
    fn new(name: &str, value: String, units: &str) -> Self {
        SummaryRow {
            name: name.to_string(),
            value,
            units: units.to_string(),
        }
    }
}

/// 执行 parse 命令
pub fn execute(args: ParseArgs) -> Result<()> {
    let (folder, filename) = resolve_target(&args.path, &args.output_filename)?;

    output::print_header("Parsing OpenMX Output");
    output::print_info(&format!("Reading '{}'", folder.root().join(&filename).display()));

    let parser = OpenmxParser::new(filename, None);
    let parsed = parser.parse(&folder, &args.md_type).map_err(|code| {
        output::print_exit_code(&code);
        code
    })?;

    let table = Table::new(summary_rows(&parsed.output));
    println!("{}", table);

    for warning in &parsed.output.warnings {
        output::print_warning(warning);
    }
    if !parsed.output.missing.is_empty() {
        output::print_skip(&format!(
            "Not present in output: {}",
            parsed.output.missing.join(", ")
        ));
    }
    if let Some(structure) = &parsed.structure {
        output::print_info(&format!(
            "Final structure {} ({} sites, V = {:.4} Å³)",
            structure.formula(),
            structure.sites.len(),
            structure.cell.volume()
        ));
    }

    if let Some(json_path) = &args.json {
        let json = serde_json::to_string_pretty(&parsed.parameters)?;
        fs::write(json_path, json).map_err(|e| OmxError::FileWriteError {
            path: json_path.display().to_string(),
            source: e,
        })?;
        output::print_written("output_parameters", &json_path.display().to_string());
    }

    Ok(())
}

/// 路径可以是文件夹或标准输出文件本身
fn resolve_target(path: &Path, default_name: &str) -> Result<(DirFolder, String)> {
    if path.is_file() {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| OmxError::InvalidArgument(format!("bad file name '{}'", path.display())))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        return Ok((DirFolder::new(parent)?, name.to_string()));
    }
    Ok((DirFolder::new(path)?, default_name.to_string()))
}

fn summary_rows(out: &OpenmxOutput) -> Vec<SummaryRow> {
    let mut rows = Vec::new();

    if let Some(v) = &out.openmx_version {
        rows.push(SummaryRow::new("OpenMX version", v.clone(), ""));
    }
    if let (Some(mpi), Some(omp)) = (out.mpi_procs, out.omp_threads) {
        rows.push(SummaryRow::new("MPI x OpenMP", format!("{} x {}", mpi, omp), ""));
    }
    if let Some(grid) = out.fft_grid {
        rows.push(SummaryRow::new(
            "FFT grid",
            format!("{} x {} x {}", grid[0], grid[1], grid[2]),
            "",
        ));
    }
    for (name, value) in out.energies.entries() {
        rows.push(SummaryRow::new(name, format!("{:.6}", value), ENERGY_UNITS));
    }
    if let Some(e) = out.energy_per_atom() {
        rows.push(SummaryRow::new("u_tot / atom", format!("{:.6}", e), ENERGY_UNITS));
    }
    if let Some(bands) = &out.bands {
        rows.push(SummaryRow::new("e_fermi", format!("{:.6}", bands.e_fermi), ENERGY_UNITS));
        rows.push(SummaryRow::new("k-points", bands.k_points.len().to_string(), ""));
    }
    if let Some(d) = out.dipole.as_ref().and_then(|d| d.absolute) {
        rows.push(SummaryRow::new("abs_dipole_mom", format!("{:.6}", d), DIPOLE_UNITS));
    }
    if !out.final_forces.is_empty() {
        let max_force = out
            .final_forces
            .iter()
            .map(|f| (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt())
            .fold(0.0_f64, f64::max);
        rows.push(SummaryRow::new("max |F|", format!("{:.6}", max_force), FORCE_UNITS));
    }
    if let Some(t) = out.timing.as_ref().and_then(|t| t.elapsed_time) {
        rows.push(SummaryRow::new("elapsed_time", format!("{:.3}", t), TIME_UNITS));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_stdout;

    #[test]
    fn test_summary_rows() {
        let text = "\
OpenMX Ver. 3.9
Total energy (Hartree) at MD = 1

  Utot.   -7.5
  Note:
";
        let out = parse_stdout(text).unwrap();
        let rows = summary_rows(&out);
        assert_eq!(rows[0].value, "3.9");
        let utot = rows.iter().find(|r| r.name == "u_tot").unwrap();
        assert_eq!(utot.units, "eV");
        assert_eq!(utot.value, format!("{:.6}", -7.5 * crate::models::units::HARTREE_TO_EV));
    }

    #[test]
    fn test_resolve_target_dir() {
        let (folder, name) = resolve_target(Path::new("."), "aiida.out").unwrap();
        assert_eq!(folder.root(), Path::new("."));
        assert_eq!(name, "aiida.out");
        assert!(resolve_target(Path::new("/no/such/dir"), "aiida.out").is_err());
    }
}
