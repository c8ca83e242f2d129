//! # DosMain 输出解析器
//!
//! DosMain 写出的 DOS/PDOS 文件为空白分隔的数值表，首列为能量 (eV)，
//! 其后为态密度与积分态密度（自旋极化时按自旋分列）。
//!
//! ## 依赖关系
//! - 被 `workflows/dos.rs`, `commands/dos.rs`, `dos/` 使用
//! - 使用 `calculations/dosmain.rs`, `parsers/mod.rs`

use super::RetrievedFolder;
use crate::calculations::dosmain::{dos_output_filenames, DosMethod, DosType};
use crate::error::ExitCode;

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;

/// 数值表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosTable {
    pub rows: Vec<Vec<f64>>,
}

impl DosTable {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// 第 `i` 列
    pub fn column(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.n_columns() {
            return None;
        }
        Some(self.rows.iter().map(|r| r[i]).collect())
    }

    /// 能量列 (eV)
    pub fn energies(&self) -> Vec<f64> {
        self.column(0).unwrap_or_default()
    }

    /// 是否为自旋极化输出（能量 + 两个自旋的 DOS + 两个积分）
    pub fn is_spin_polarized(&self) -> bool {
        self.n_columns() >= 5
    }
}

/// 解析 DOS 数值表
///
/// 跳过空行与 `#` 注释行；行长不一致或含非数值为 `OutputDosParse`，
/// 没有任何数据行为 `OutputDosIncomplete`。
pub fn parse_dos_table(text: &str) -> Result<DosTable, ExitCode> {
    let mut table = DosTable::default();

    for line in text.lines() {
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let row = t
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ExitCode::OutputDosParse)?;
        if let Some(first) = table.rows.first() {
            if first.len() != row.len() {
                return Err(ExitCode::OutputDosParse);
            }
        }
        table.rows.push(row);
    }

    if table.rows.is_empty() {
        return Err(ExitCode::OutputDosIncomplete);
    }
    Ok(table)
}

/// DosMain 解析结果：文件名 -> 数值表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DosmainParsed {
    pub tables: BTreeMap<String, DosTable>,
}

/// DosMain 作业解析器
#[derive(Debug, Clone)]
pub struct DosmainParser {
    pub dos_type: DosType,
    pub dos_method: DosMethod,
    pub atoms: Vec<usize>,
}

impl DosmainParser {
    pub fn new(dos_type: DosType, dos_method: DosMethod, atoms: Vec<usize>) -> Self {
        DosmainParser {
            dos_type,
            dos_method,
            atoms,
        }
    }

    pub fn parse(&self, retrieved: &dyn RetrievedFolder) -> Result<DosmainParsed, ExitCode> {
        let names = retrieved
            .list_object_names()
            .map_err(|_| ExitCode::NoRetrievedFolder)?;

        let mut parsed = DosmainParsed::default();
        for filename in dos_output_filenames(self.dos_type, self.dos_method, &self.atoms) {
            if !names.contains(&filename) {
                return Err(ExitCode::OutputDosMissing);
            }
            let text = retrieved
                .read_to_string(&filename)
                .map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => ExitCode::OutputDosMissing,
                    _ => ExitCode::OutputDosRead,
                })?;
            let table = parse_dos_table(&text)?;
            debug!(
                "Parsed {}: {} rows x {} columns",
                filename,
                table.n_rows(),
                table.n_columns()
            );
            parsed.tables.insert(filename, table);
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::MemoryFolder;

    const DOS: &str = "\
# energy DOS IDOS
 -10.0  0.0  0.0
  -5.0  0.5  1.0
   0.0  1.5  4.0
";

    #[test]
    fn test_parse_table() {
        let table = parse_dos_table(DOS).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_columns(), 3);
        assert_eq!(table.energies(), vec![-10.0, -5.0, 0.0]);
        assert_eq!(table.column(2).unwrap(), vec![0.0, 1.0, 4.0]);
        assert!(table.column(3).is_none());
        assert!(!table.is_spin_polarized());
    }

    #[test]
    fn test_table_errors() {
        assert_eq!(parse_dos_table("").unwrap_err(), ExitCode::OutputDosIncomplete);
        assert_eq!(parse_dos_table("# only\n").unwrap_err(), ExitCode::OutputDosIncomplete);
        assert_eq!(parse_dos_table("1 2 3\n4 5\n").unwrap_err(), ExitCode::OutputDosParse);
        assert_eq!(parse_dos_table("1 x 3\n").unwrap_err(), ExitCode::OutputDosParse);
    }

    #[test]
    fn test_parser_picks_file_by_method() {
        let folder = MemoryFolder::new()
            .with_file("aiida.DOS.Tetrahedron", DOS)
            .with_file("aiida.out", "");

        let parser = DosmainParser::new(DosType::Dos, DosMethod::Tetrahedron, vec![]);
        let parsed = parser.parse(&folder).unwrap();
        assert_eq!(parsed.tables["aiida.DOS.Tetrahedron"].n_rows(), 3);

        let parser = DosmainParser::new(DosType::Dos, DosMethod::Gaussian, vec![]);
        assert_eq!(parser.parse(&folder).unwrap_err(), ExitCode::OutputDosMissing);
    }

    #[test]
    fn test_parser_pdos_files() {
        let folder = MemoryFolder::new()
            .with_file("aiida.PDOS.Gaussian.atom1", DOS)
            .with_file("aiida.PDOS.Gaussian.atom2", DOS);

        let parser = DosmainParser::new(DosType::Pdos, DosMethod::Gaussian, vec![1, 2]);
        assert_eq!(parser.parse(&folder).unwrap().tables.len(), 2);

        let parser = DosmainParser::new(DosType::Pdos, DosMethod::Gaussian, vec![3]);
        assert_eq!(parser.parse(&folder).unwrap_err(), ExitCode::OutputDosMissing);
    }
}
