//! # OpenMX 输入文件渲染
//!
//! 将计算请求渲染为 OpenMX 输入文本：先写固定的系统关键字，再写由结构、
//! 赝势、基组与 k 点生成的部分，最后按关键字名排序写入用户参数。
//! 同一请求总是得到逐字节相同的文本。
//!
//! ## 依赖关系
//! - 被 `calculations/openmx.rs`, `commands/write.rs` 使用
//! - 使用 `input/validate.rs`, `models/`

use crate::error::{OmxError, Result};
use crate::input::keywords::{Keyword, ValueKind};
use crate::input::validate::{format_scalar, validate_request, ValidatedRequest};
use crate::models::request::file_stem;
use crate::models::CalculationRequest;

use log::debug;
use serde_json::Value;

/// 固定的系统名，输出文件均以此为前缀
pub const SYSTEM_NAME: &str = "aiida";

const KEY_WIDTH: usize = 32;

/// 渲染结果：有序的行序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInput {
    pub lines: Vec<String>,
}

impl RenderedInput {
    /// 完整文本，以换行结尾
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

struct LineWriter {
    lines: Vec<String>,
}

impl LineWriter {
    fn key(&mut self, key: &str, value: impl std::fmt::Display) {
        self.lines.push(format!("{:<width$} {}", key, value, width = KEY_WIDTH));
    }

    fn block<I>(&mut self, tag: &str, rows: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.lines.push(format!("<{}", tag));
        self.lines.extend(rows.into_iter().map(|r| format!("  {}", r)));
        self.lines.push(format!("{}>", tag));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }
}

/// 渲染 OpenMX 输入
pub fn render_input(request: &CalculationRequest) -> Result<RenderedInput> {
    let validated = validate_request(request)?;
    let mut w = LineWriter { lines: Vec::new() };

    write_system(&mut w);
    write_species(&mut w, request, &validated)?;
    write_atoms(&mut w, request)?;
    write_kgrid(&mut w, request);
    write_parameters(&mut w, &validated.parameters)?;

    debug!(
        "Rendered OpenMX input: {} lines, {} user parameters",
        w.lines.len(),
        validated.parameters.len()
    );

    Ok(RenderedInput { lines: w.lines })
}

fn write_system(w: &mut LineWriter) {
    w.key("System.CurrentDirectory", "./");
    w.key("System.Name", SYSTEM_NAME);
    w.key("DATA.PATH", "./");
    w.key("level.of.stdout", 1);
    w.key("level.of.fileout", 1);
    w.blank();
}

fn write_species(
    w: &mut LineWriter,
    request: &CalculationRequest,
    validated: &ValidatedRequest<'_>,
) -> Result<()> {
    let kinds = &request.structure.kinds;
    w.key("Species.Number", kinds.len());

    let mut rows = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let orbital = lookup(&request.orbitals, &kind.name, "orbital basis")?;
        let pseudo = lookup(&request.pseudos, &kind.name, "pseudopotential")?;
        rows.push(format!(
            "{} {}-{} {}",
            kind.name,
            file_stem(&orbital.filename),
            orbital.configuration_string(),
            file_stem(&pseudo.filename)
        ));
    }
    w.block("Definition.of.Atomic.Species", rows);
    w.key("scf.XcType", validated.xc_type);
    w.blank();
    Ok(())
}

fn write_atoms(w: &mut LineWriter, request: &CalculationRequest) -> Result<()> {
    let structure = &request.structure;
    w.key("Atoms.Number", structure.sites.len());
    w.key("Atoms.SpeciesAndCoordinates.Unit", "Ang");

    let mut rows = Vec::with_capacity(structure.sites.len());
    for (i, site) in structure.sites.iter().enumerate() {
        let orbital = lookup(&request.orbitals, &site.kind_name, "orbital basis")?;
        let half = orbital.z_valence / 2.0;
        let [x, y, z] = site.position;
        rows.push(format!(
            "{} {} {:.12} {:.12} {:.12} {:.6} {:.6}",
            i + 1,
            site.kind_name,
            x,
            y,
            z,
            half,
            half
        ));
    }
    w.block("Atoms.SpeciesAndCoordinates", rows);

    w.key("Atoms.UnitVectors.Unit", "Ang");
    let rows = structure
        .cell
        .matrix
        .iter()
        .map(|v| format!("{:.12} {:.12} {:.12}", v[0], v[1], v[2]));
    w.block("Atoms.UnitVectors", rows);
    w.blank();
    Ok(())
}

fn write_kgrid(w: &mut LineWriter, request: &CalculationRequest) {
    let [n1, n2, n3] = request.kpoints.mesh;
    w.key("scf.Kgrid", format!("{} {} {}", n1, n2, n3));
    w.blank();
}

fn write_parameters(w: &mut LineWriter, parameters: &[(&'static Keyword, &Value)]) -> Result<()> {
    for (kw, value) in parameters {
        let element_kind = match kw.kind {
            ValueKind::IntVec(_) => ValueKind::Int,
            other => other,
        };
        let cannot_render =
            || OmxError::InputValidation(format!("cannot render value of '{}'", kw.name));

        match value {
            Value::Array(rows) if rows.iter().any(Value::is_array) => {
                let mut block = Vec::with_capacity(rows.len());
                for row in rows {
                    let cells = match row {
                        Value::Array(cells) => cells.iter().collect::<Vec<_>>(),
                        other => vec![other],
                    };
                    let text = cells
                        .into_iter()
                        .map(|c| format_scalar(element_kind, c).ok_or_else(cannot_render))
                        .collect::<Result<Vec<_>>>()?;
                    block.push(text.join(" "));
                }
                w.block(kw.name, block);
            }
            Value::Array(items) => {
                let text = items
                    .iter()
                    .map(|c| format_scalar(element_kind, c).ok_or_else(cannot_render))
                    .collect::<Result<Vec<_>>>()?;
                w.key(kw.name, text.join(" "));
            }
            scalar => {
                let text = format_scalar(kw.kind, scalar).ok_or_else(cannot_render)?;
                w.key(kw.name, text);
            }
        }
    }
    Ok(())
}

fn lookup<'a, T>(
    map: &'a std::collections::BTreeMap<String, T>,
    kind: &str,
    what: &str,
) -> Result<&'a T> {
    map.get(kind)
        .ok_or_else(|| OmxError::InputValidation(format!("no {} for kind '{}'", what, kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CalcOptions, Kind, KpointMesh, Lattice, OrbitalBasis, PseudoFile, Structure,
    };
    use serde_json::json;
    use std::collections::BTreeMap;

    fn silicon_request() -> CalculationRequest {
        let mut structure = Structure::new(Lattice::from_vectors([
            [0.0, 2.7155, 2.7155],
            [2.7155, 0.0, 2.7155],
            [2.7155, 2.7155, 0.0],
        ]));
        structure.append_atom(Kind::new("Si", "Si"), [0.0, 0.0, 0.0]);
        structure.append_atom(Kind::new("Si", "Si"), [1.35775, 1.35775, 1.35775]);

        let mut parameters = BTreeMap::new();
        parameters.insert("SCF_ENERGYCUTOFF".to_string(), json!(150));
        parameters.insert("scf.maxIter".to_string(), json!(40));
        parameters.insert("scf.SpinPolarization".to_string(), json!("off"));
        parameters.insert("Dos.fileout".to_string(), json!(true));
        parameters.insert("Dos.Erange".to_string(), json!([-20.0, 20.0]));
        parameters.insert(
            "MD.Fixed.XYZ".to_string(),
            json!([[1, 1, 1, 1], [2, 0, 0, 0]]),
        );

        let mut pseudos = BTreeMap::new();
        pseudos.insert(
            "Si".to_string(),
            PseudoFile {
                filename: "Si_PBE19.vps".to_string(),
                element: "Si".to_string(),
                xc_type: "GGA-PBE".to_string(),
                path: None,
            },
        );
        let mut orbitals = BTreeMap::new();
        orbitals.insert(
            "Si".to_string(),
            OrbitalBasis {
                filename: "Si7.0.pao".to_string(),
                element: "Si".to_string(),
                orbital_configuration: vec![2, 2, 1],
                z_valence: 4.0,
                path: None,
            },
        );

        CalculationRequest {
            structure,
            kpoints: KpointMesh { mesh: [4, 4, 4] },
            parameters,
            settings: BTreeMap::new(),
            pseudos,
            orbitals,
            options: CalcOptions::default(),
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let req = silicon_request();
        let a = render_input(&req).unwrap().text();
        let b = render_input(&req.clone()).unwrap().text();
        assert_eq!(a, b);
        assert!(a.ends_with('\n'));
    }

    #[test]
    fn test_render_generated_sections() {
        let text = render_input(&silicon_request()).unwrap().text();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("System.CurrentDirectory"));
        assert!(lines[0].ends_with(" ./"));
        assert!(lines.contains(&"  Si Si7.0-s2p2d1 Si_PBE19"));
        assert!(lines.iter().any(|l| l.starts_with("scf.XcType") && l.ends_with("GGA-PBE")));
        assert!(lines.contains(&"  2 Si 1.357750000000 1.357750000000 1.357750000000 2.000000 2.000000"));
        assert!(lines.contains(&"  0.000000000000 2.715500000000 2.715500000000"));
        assert!(lines.iter().any(|l| l.starts_with("scf.Kgrid") && l.ends_with("4 4 4")));
        assert!(lines.contains(&"<Atoms.UnitVectors"));
        assert!(lines.contains(&"Atoms.UnitVectors>"));
    }

    #[test]
    fn test_render_user_parameters() {
        let text = render_input(&silicon_request()).unwrap().text();
        let find = |key: &str| {
            text.lines()
                .find(|l| l.split_whitespace().next() == Some(key))
                .map(|l| l.split_whitespace().skip(1).collect::<Vec<_>>().join(" "))
        };

        assert_eq!(find("scf.energycutoff").unwrap(), "150.000000000000");
        assert_eq!(find("scf.maxIter").unwrap(), "40");
        assert_eq!(find("Dos.fileout").unwrap(), "on");
        assert_eq!(find("scf.SpinPolarization").unwrap(), "off");
        assert_eq!(
            find("Dos.Erange").unwrap(),
            "-20.000000000000 20.000000000000"
        );
        assert!(text.contains("<MD.Fixed.XYZ\n  1 1 1 1\n  2 0 0 0\nMD.Fixed.XYZ>\n"));
    }

    #[test]
    fn test_user_parameters_sorted_after_generated() {
        let text = render_input(&silicon_request()).unwrap().text();
        let kgrid = text.find("scf.Kgrid").unwrap();
        let dos = text.find("Dos.Erange").unwrap();
        let ecut = text.find("scf.energycutoff").unwrap();
        assert!(kgrid < dos && dos < ecut);
    }

    #[test]
    fn test_missing_orbital_rejected() {
        let mut req = silicon_request();
        req.orbitals.clear();
        let err = render_input(&req).unwrap_err();
        assert!(matches!(err, OmxError::InputValidation(_)));
    }

    #[test]
    fn test_inconsistent_xc_rejected() {
        let mut req = silicon_request();
        req.structure
            .append_atom(Kind::new("O", "O"), [0.5, 0.5, 0.5]);
        let mut o_pseudo = req.pseudos["Si"].clone();
        o_pseudo.xc_type = "LDA".to_string();
        req.pseudos.insert("O".to_string(), o_pseudo);
        req.orbitals
            .insert("O".to_string(), req.orbitals["Si"].clone());

        let err = render_input(&req).unwrap_err();
        assert!(err.to_string().contains("share one xc type"));
    }

    #[test]
    fn test_zero_kpoint_rejected() {
        let mut req = silicon_request();
        req.kpoints.mesh = [4, 0, 4];
        assert!(render_input(&req).is_err());
    }

    #[test]
    fn test_empty_structure_rejected() {
        let mut req = silicon_request();
        req.structure.sites.clear();
        assert!(render_input(&req).is_err());
    }
}
