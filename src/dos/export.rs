//! # DOS 数据导出
//!
//! 将 DosMain 数值表导出为带表头的 CSV。
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 调用
//! - 使用 `parsers/dos.rs` 的 DosTable 结构
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{OmxError, Result};
use crate::parsers::DosTable;

use std::path::Path;

/// 按列数推断列名
pub fn column_names(table: &DosTable) -> Vec<String> {
    match table.n_columns() {
        3 => vec!["energy_ev", "dos", "integrated_dos"]
            .into_iter()
            .map(String::from)
            .collect(),
        5 => vec![
            "energy_ev",
            "dos_up",
            "dos_down",
            "integrated_dos_up",
            "integrated_dos_down",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        n => std::iter::once("energy_ev".to_string())
            .chain((1..n).map(|i| format!("col{}", i)))
            .collect(),
    }
}

/// 导出为 CSV
pub fn to_csv(table: &DosTable, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(column_names(table))?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| format!("{:.6}", v)))?;
    }

    wtr.flush().map_err(|e| OmxError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_column_names() {
        let table = DosTable {
            rows: vec![vec![0.0; 5]],
        };
        assert_eq!(column_names(&table)[2], "dos_down");

        let table = DosTable {
            rows: vec![vec![0.0; 4]],
        };
        assert_eq!(column_names(&table), vec!["energy_ev", "col1", "col2", "col3"]);
    }

    #[test]
    fn test_to_csv() {
        let path = std::env::temp_dir().join(format!("omxutil_dos_{}.csv", std::process::id()));
        let table = DosTable {
            rows: vec![vec![-1.0, 0.5, 0.25], vec![0.0, 1.0, 1.0]],
        };
        to_csv(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "energy_ev,dos,integrated_dos");
        assert_eq!(lines[1], "-1.000000,0.500000,0.250000");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }
}
