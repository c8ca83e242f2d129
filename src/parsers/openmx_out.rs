//! # OpenMX 标准输出解析器
//!
//! 按固定标记定位 OpenMX 标准输出中的各个小节，提取版本、并行信息、
//! 实际截断能与网格、能量分量、本征值、晶胞优化历史、偶极矩、最终结构与受力、
//! 以及计时信息。能量统一换算为 eV，长度为 Å，受力为 eV/Å。
//!
//! 只有缺少总能小节（或其中的 `Utot.`）会使整次解析失败，
//! 此时返回 `ExitCode::OutputStdoutIncomplete`；其余小节格式异常时记录警告并留空。
//!
//! ## 依赖关系
//! - 被 `workflows/dos.rs`, `commands/parse.rs`, `commands/collect.rs` 使用
//! - 使用 `models/calculation.rs`, `models/structure.rs`, `parsers/mod.rs`

use super::{extract_value_after_eq, RetrievedFolder};
use crate::error::ExitCode;
use crate::models::units::*;
use crate::models::{
    CellOptStep, DipoleMoments, EnergyTerms, Eigenvalues, Kind, LabeledPosition, Lattice,
    OpenmxOutput, RoutineTiming, Structure, Timing,
};

use log::{debug, warn};
use regex::Regex;
use serde_json::{Map, Value};
use std::io;

type ParseResult<T> = std::result::Result<T, ExitCode>;

// ─────────────────────────────────────────────────────────────
// 小节标记
// ─────────────────────────────────────────────────────────────
const CUTOFF_MARKER: &str = "Used cutoff energy (Ryd) for 3D-grids";
const GRID_MARKER: &str = "Num. of grids of a-, b-, and c-axes";
const ENERGY_MARKER: &str = "Total energy (Hartree) at MD";
const ENERGY_END: &str = "Note:";
const EIGENVALUES_MARKER: &str = "Eigenvalues (Hartree) of SCF KS-eq.";
const CELL_OPT_MARKER: &str = "History of cell optimization";
const DIPOLE_MARKER: &str = "Dipole moment (Debye)";
const CELL_MARKER: &str = "Cell vectors (Ang.) and derivatives of total energy";
const FORCES_MARKER: &str = "xyz-coordinates (Ang.) and forces (Hartree/Bohr)";
const FORCES_END: &str = "coordinates.forces>";
const FRACTIONAL_MARKER: &str = "Fractional coordinates of the final structure";
const TIMING_MARKER: &str = "Computational Time (second)";

/// OpenMX 能量名 (去掉末尾的 `.`) -> 结果名
const ENERGY_NAMES: &[(&str, &str)] = &[
    ("Uele", "u_band"),
    ("Ukin", "u_kinetic"),
    ("UH0", "u_e_screened_coulomb"),
    ("UH1", "u_ee_coulomb"),
    ("Una", "u_neutral_atom"),
    ("Unl", "u_non_local"),
    ("Uxc0", "u_xc_alpha"),
    ("Uxc1", "u_xc_beta"),
    ("Ucore", "u_core_core_coulomb"),
    ("Uhub", "u_hubbard"),
    ("Ucs", "u_spin_constraint"),
    ("Uzs", "u_zeeman_spin_mag"),
    ("Uzo", "u_zeeman_spin_orb"),
    ("Uef", "u_e_field"),
    ("UvdW", "u_vdw"),
    ("Uch", "u_core_hole"),
    ("Utot", "u_tot"),
    ("UpV", "u_press_vol"),
    ("Enpy", "enthalpy"),
];

/// OpenMX 例程名 -> 计时结果名
const TIMING_NAMES: &[(&str, &str)] = &[
    ("readfile", "read_input"),
    ("truncation", "truncation"),
    ("MD_pac", "md_pac"),
    ("OutData", "write_output"),
    ("DFT", "dft"),
    ("Set_OLP_Kin", "ovlp_kin"),
    ("Set_Nonlocal", "nonlocal"),
    ("Set_ProExpn_VNA", "pro_expn_vna"),
    ("Set_Hamiltonian", "ham"),
    ("Poisson", "poisson"),
    ("Diagonalization", "diag"),
    ("Mixing_DM", "mixing_dm"),
    ("Force", "force"),
    ("Total_Energy", "total_ene"),
    ("Set_Aden_Grid", "aden_grid"),
    ("Set_Orbitals_Grid", "orb_grid"),
    ("Set_Density_Grid", "den_grid"),
    ("RestartFileDFT", "write_restart"),
    ("Mulliken_Charge", "mulliken_chg"),
    ("FFT(2D)_Density", "fft_2d_den"),
    ("Others", "other"),
];

/// 会改变晶胞的 MD.Type，最终结构使用输出中的晶胞
const CELL_CHANGING_MD_TYPES: &[&str] = &[
    "optc1", "optc2", "optc3", "optc4", "optc5", "optc6", "optc7", "rfc5", "rfc6", "rfc7",
];

struct Patterns {
    version: Regex,
    mpi: Regex,
    omp: Regex,
}

impl Patterns {
    fn new() -> ParseResult<Self> {
        let build = |p: &str| Regex::new(p).map_err(|_| ExitCode::UnexpectedParserException);
        Ok(Patterns {
            version: build(r"OpenMX Ver\.\s*(\S+)")?,
            mpi: build(r"(\d+)\s+MPI process")?,
            omp: build(r"(\d+)\s+OpenMP thread")?,
        })
    }
}

/// 解析 OpenMX 标准输出全文
pub fn parse_stdout(text: &str) -> ParseResult<OpenmxOutput> {
    let patterns = Patterns::new()?;
    let lines: Vec<&str> = text.lines().collect();
    let mut out = OpenmxOutput::default();
    let mut energy_blocks = 0usize;

    for (i, line) in lines.iter().enumerate() {
        if out.openmx_version.is_none() {
            if let Some(c) = patterns.version.captures(line) {
                out.openmx_version = Some(c[1].trim_end_matches(',').to_string());
            }
        }
        if let Some(c) = patterns.mpi.captures(line) {
            out.mpi_procs = c[1].parse().ok();
        }
        if let Some(c) = patterns.omp.captures(line) {
            out.omp_threads = c[1].parse().ok();
        }

        if line.contains(CUTOFF_MARKER) {
            match parse_triplet(line) {
                Ok([a, b, c]) => {
                    out.true_scf_ecut = Some([a * RYDBERG_TO_EV, b * RYDBERG_TO_EV, c * RYDBERG_TO_EV])
                }
                Err(e) => note_warning(&mut out, "true_scf_ecut", &e),
            }
        }

        if line.contains(GRID_MARKER) {
            match parse_triplet(line) {
                Ok([a, b, c]) => out.fft_grid = Some([a as usize, b as usize, c as usize]),
                Err(e) => note_warning(&mut out, "3d_fft_grid", &e),
            }
        }

        if line.contains(ENERGY_MARKER) {
            energy_blocks += 1;
            match parse_energy_block(&lines[i + 1..]) {
                Ok(terms) => {
                    if let Some(u_tot) = terms.u_tot {
                        out.energy_history.push(u_tot);
                    }
                    out.energies = terms;
                }
                Err(e) => {
                    warn!("Could not parse energy block {}: {}", energy_blocks, e);
                    return Err(ExitCode::OutputStdoutParse);
                }
            }
        }

        if line.contains(EIGENVALUES_MARKER) {
            match parse_eigenvalues(section_body(&lines, i)) {
                Ok(bands) => out.bands = Some(bands),
                Err(e) => note_warning(&mut out, "eigenvalues", &e),
            }
        }

        if line.contains(CELL_OPT_MARKER) {
            match parse_cell_opt(section_body(&lines, i)) {
                Ok(history) => out.cell_opt_history = history,
                Err(e) => note_warning(&mut out, "cell_opt_history", &e),
            }
        }

        if line.contains(DIPOLE_MARKER) {
            match parse_dipole(section_body(&lines, i)) {
                Ok(dipole) => out.dipole = Some(dipole),
                Err(e) => note_warning(&mut out, "dipole", &e),
            }
        }

        if line.contains(CELL_MARKER) {
            match parse_cell_vectors(section_body(&lines, i)) {
                Ok((cell, de_dcell)) => {
                    out.final_cell = Some(cell);
                    out.final_de_dcell = Some(de_dcell);
                }
                Err(e) => note_warning(&mut out, "final_cell", &e),
            }
        }

        if line.contains(FORCES_MARKER) {
            match parse_coordinates_forces(section_body(&lines, i)) {
                Ok((positions, forces)) => {
                    out.final_positions = positions;
                    out.final_forces = forces;
                }
                Err(e) => note_warning(&mut out, "final_forces", &e),
            }
        }

        if line.contains(FRACTIONAL_MARKER) {
            match parse_fractional(section_body(&lines, i)) {
                Ok(positions) => out.final_fractional = positions,
                Err(e) => note_warning(&mut out, "final_fractional", &e),
            }
        }

        if line.contains(TIMING_MARKER) {
            // 计时小节位于文件末尾，内部含 `*** In DFT ***` 之类的行
            match parse_timing(&lines[i + 1..]) {
                Ok(timing) => out.timing = Some(timing),
                Err(e) => note_warning(&mut out, "timing", &e),
            }
        }
    }

    if energy_blocks == 0 || out.energies.u_tot.is_none() {
        warn!(
            "OpenMX output is incomplete: {} energy block(s), total energy {}",
            energy_blocks,
            if out.energies.u_tot.is_some() { "found" } else { "missing" }
        );
        return Err(ExitCode::OutputStdoutIncomplete);
    }

    record_missing(&mut out);
    debug!(
        "Parsed OpenMX output: {} MD step(s), {} warning(s), {} missing",
        out.energy_history.len(),
        out.warnings.len(),
        out.missing.len()
    );

    Ok(out)
}

fn note_warning(out: &mut OpenmxOutput, section: &str, reason: &str) {
    warn!("Could not parse {} section: {}", section, reason);
    out.warnings.push(format!("{}: {}", section, reason));
}

fn record_missing(out: &mut OpenmxOutput) {
    let checks = [
        ("openmx_version", out.openmx_version.is_none()),
        ("mpi_procs", out.mpi_procs.is_none()),
        ("omp_threads", out.omp_threads.is_none()),
        ("true_scf_ecut", out.true_scf_ecut.is_none()),
        ("3d_fft_grid", out.fft_grid.is_none()),
        ("eigenvalues", out.bands.is_none()),
        ("dipole", out.dipole.is_none()),
        ("final_cell", out.final_cell.is_none()),
        ("final_forces", out.final_forces.is_empty()),
        ("timing", out.timing.is_none()),
    ];
    out.missing = checks
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();
}

fn is_separator(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3 && t.chars().all(|c| c == '*')
}

/// 标记行之后的小节正文
///
/// 跳过紧随标记的星号分隔行与空行，到下一条星号分隔行为止。
fn section_body<'a>(lines: &'a [&'a str], marker: usize) -> &'a [&'a str] {
    let mut start = marker + 1;
    while start < lines.len() && (is_separator(lines[start]) || lines[start].trim().is_empty()) {
        start += 1;
    }
    let end = lines[start..]
        .iter()
        .position(|l| is_separator(l))
        .map(|p| start + p)
        .unwrap_or(lines.len());
    &lines[start..end]
}

fn parse_f64(token: &str) -> Result<f64, String> {
    token
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", token))
}

fn parse_floats(tokens: &[&str]) -> Result<Vec<f64>, String> {
    tokens.iter().map(|t| parse_f64(t)).collect()
}

/// `... = a, b, c`
fn parse_triplet(line: &str) -> Result<[f64; 3], String> {
    let values = line
        .split('=')
        .nth(1)
        .ok_or_else(|| "missing '='".to_string())?
        .split(',')
        .map(|t| parse_f64(t.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(format!("expected 3 values, found {}", values.len())),
    }
}

fn parse_energy_block(lines: &[&str]) -> Result<EnergyTerms, String> {
    let mut terms = EnergyTerms::default();

    for line in lines {
        if line.contains(ENERGY_END) {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (name, value) = match tokens.as_slice() {
            [name, value, ..] => (name.trim_end_matches('.'), value),
            _ => continue,
        };
        if let Some((_, field)) = ENERGY_NAMES.iter().find(|(openmx, _)| *openmx == name) {
            let hartree = parse_f64(value)?;
            if let Some(slot) = terms.slot_mut(field) {
                *slot = Some(hartree * HARTREE_TO_EV);
            }
        }
    }

    Ok(terms)
}

fn parse_eigenvalues(body: &[&str]) -> Result<Eigenvalues, String> {
    let mut bands = Eigenvalues::default();
    let mut e_fermi = None;
    let mut n_states = None;

    for line in body {
        let t = line.trim();
        if t.starts_with("Chemical Potential") {
            let v = extract_value_after_eq(t).ok_or("invalid chemical potential")?;
            e_fermi = Some(v * HARTREE_TO_EV);
        } else if t.starts_with("Number of States") {
            n_states = Some(extract_value_after_eq(t).ok_or("invalid number of states")?);
        } else if t.starts_with("kloop") {
            bands.k_points.push([0.0; 3]);
            bands.up.push(Vec::new());
            bands.down.push(Vec::new());
        } else if t.starts_with("k1=") {
            let tokens: Vec<&str> = t.split_whitespace().filter(|w| !w.ends_with('=')).collect();
            let k = parse_floats(&tokens)?;
            let slot = bands.k_points.last_mut().ok_or("k-point before kloop")?;
            match k.as_slice() {
                [k1, k2, k3] => *slot = [*k1, *k2, *k3],
                _ => return Err(format!("malformed k-point line '{}'", t)),
            }
        } else {
            let tokens: Vec<&str> = t.split_whitespace().collect();
            if tokens.len() < 2 || tokens[0].parse::<usize>().is_err() {
                continue;
            }
            let values = parse_floats(&tokens[1..])?;
            if bands.up.is_empty() {
                // 无 kloop 的团簇计算只有 Γ 点
                bands.k_points.push([0.0; 3]);
                bands.up.push(Vec::new());
                bands.down.push(Vec::new());
            }
            let k = bands.up.len() - 1;
            match values.as_slice() {
                [up] => bands.up[k].push(up * HARTREE_TO_EV),
                [up, down] => {
                    bands.up[k].push(up * HARTREE_TO_EV);
                    bands.down[k].push(down * HARTREE_TO_EV);
                }
                _ => return Err(format!("malformed eigenvalue row '{}'", t)),
            }
        }
    }

    bands.e_fermi = e_fermi.ok_or("chemical potential not found")?;
    bands.n_states = n_states.ok_or("number of states not found")?;
    Ok(bands)
}

fn parse_cell_opt(body: &[&str]) -> Result<Vec<CellOptStep>, String> {
    let mut history = Vec::new();

    for line in body {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 7 {
            continue;
        }
        let md_iter = match tokens[0].parse::<usize>() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let v = parse_floats(&tokens[1..])?;
        history.push(CellOptStep {
            md_iter,
            sd_scaling: v[0],
            abs_max_force: v[1] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
            max_step: v[2],
            u_tot: v[3] * HARTREE_TO_EV,
            enthalpy: v[4] * HARTREE_TO_EV,
            volume: v[5],
        });
    }

    if history.is_empty() {
        return Err("no optimization steps".to_string());
    }
    Ok(history)
}

fn parse_dipole(body: &[&str]) -> Result<DipoleMoments, String> {
    let mut dipole = DipoleMoments::default();

    for line in body {
        let t = line.trim();
        let lower = t.to_lowercase();
        if lower.starts_with("absolute d") {
            let last = t.split_whitespace().last().ok_or("empty line")?;
            dipole.absolute = Some(parse_f64(last)?);
            continue;
        }

        let slot = if lower.starts_with("total") {
            &mut dipole.total
        } else if lower.starts_with("core") {
            &mut dipole.core
        } else if lower.starts_with("electron") {
            &mut dipole.electron
        } else if lower.starts_with("back ground") {
            &mut dipole.background
        } else {
            continue;
        };

        let tokens: Vec<&str> = t.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(format!("malformed dipole line '{}'", t));
        }
        let v = parse_floats(&tokens[tokens.len() - 3..])?;
        *slot = Some([v[0], v[1], v[2]]);
    }

    if dipole == DipoleMoments::default() {
        return Err("no dipole components".to_string());
    }
    Ok(dipole)
}

type Matrix3 = [[f64; 3]; 3];

fn parse_cell_vectors(body: &[&str]) -> Result<(Matrix3, Matrix3), String> {
    let mut cell = Vec::new();
    let mut de_dcell = Vec::new();

    for line in body {
        let t = line.trim();
        if !(t.starts_with("a1") || t.starts_with("a2") || t.starts_with("a3")) {
            continue;
        }
        let parts: Vec<&str> = t.split('=').collect();
        if parts.len() != 3 {
            return Err(format!("malformed cell vector line '{}'", t));
        }
        let vec_tokens: Vec<&str> = parts[1].split_whitespace().take(3).collect();
        let de_tokens: Vec<&str> = parts[2].split_whitespace().collect();
        let v = parse_floats(&vec_tokens)?;
        let d = parse_floats(&de_tokens)?;
        if v.len() != 3 || d.len() != 3 {
            return Err(format!("malformed cell vector line '{}'", t));
        }
        cell.push([v[0], v[1], v[2]]);
        de_dcell.push([
            d[0] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
            d[1] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
            d[2] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
        ]);
    }

    match (cell.as_slice(), de_dcell.as_slice()) {
        ([a, b, c], [da, db, dc]) => Ok(([*a, *b, *c], [*da, *db, *dc])),
        _ => Err(format!("expected 3 cell vectors, found {}", cell.len())),
    }
}

fn parse_coordinates_forces(body: &[&str]) -> Result<(Vec<LabeledPosition>, Vec<[f64; 3]>), String> {
    let mut positions = Vec::new();
    let mut forces = Vec::new();
    let mut declared: Option<usize> = None;

    for line in body {
        let t = line.trim();
        if t.starts_with(FORCES_END) {
            break;
        }
        let tokens: Vec<&str> = t.split_whitespace().collect();
        match tokens.len() {
            1 => declared = tokens[0].parse().ok().or(declared),
            8 if tokens[0].parse::<usize>().is_ok() => {
                let v = parse_floats(&tokens[2..])?;
                positions.push(LabeledPosition {
                    species: tokens[1].to_string(),
                    position: [v[0], v[1], v[2]],
                });
                forces.push([
                    v[3] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
                    v[4] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
                    v[5] * HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM,
                ]);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err("no atoms".to_string());
    }
    if let Some(n) = declared {
        if n != positions.len() {
            return Err(format!("expected {} atoms, found {}", n, positions.len()));
        }
    }
    Ok((positions, forces))
}

fn parse_fractional(body: &[&str]) -> Result<Vec<LabeledPosition>, String> {
    let mut positions = Vec::new();

    for line in body {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 5 || tokens[0].parse::<usize>().is_err() {
            continue;
        }
        let v = parse_floats(&tokens[2..])?;
        positions.push(LabeledPosition {
            species: tokens[1].to_string(),
            position: [v[0], v[1], v[2]],
        });
    }

    if positions.is_empty() {
        return Err("no atoms".to_string());
    }
    Ok(positions)
}

fn parse_timing(lines: &[&str]) -> Result<Timing, String> {
    let mut timing = Timing::default();

    for line in lines {
        let t = line.trim();
        if t.starts_with("Elapsed.Time.") {
            let value = t.split_whitespace().nth(1).ok_or("missing elapsed time")?;
            timing.elapsed_time = Some(parse_f64(value)?);
            continue;
        }

        let (name, rest) = match t.split_once('=') {
            Some((name, rest)) => (name.trim(), rest),
            None => continue,
        };
        let field = match TIMING_NAMES.iter().find(|(openmx, _)| *openmx == name) {
            Some((_, field)) => field,
            None => continue,
        };
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(format!("malformed timing line '{}'", t));
        }
        let ids = (tokens[0].parse::<usize>(), tokens[2].parse::<usize>());
        let (min_id, max_id) = match ids {
            (Ok(a), Ok(b)) => (a, b),
            _ => return Err(format!("malformed timing line '{}'", t)),
        };
        timing.routines.insert(
            field.to_string(),
            RoutineTiming {
                min_id,
                min_time: parse_f64(tokens[1])?,
                max_id,
                max_time: parse_f64(tokens[3])?,
            },
        );
    }

    if timing.elapsed_time.is_none() && timing.routines.is_empty() {
        return Err("no timing entries".to_string());
    }
    Ok(timing)
}

/// OpenMX 解析结果：输出参数字典与（可选的）最终结构
#[derive(Debug, Clone)]
pub struct OpenmxParsed {
    pub output: OpenmxOutput,
    pub parameters: Map<String, Value>,
    pub structure: Option<Structure>,
}

/// OpenMX 作业解析器
#[derive(Debug, Clone)]
pub struct OpenmxParser {
    /// 标准输出文件名
    pub output_filename: String,
    /// 输入结构，用于种类符号与不变晶胞
    pub input_structure: Option<Structure>,
}

impl OpenmxParser {
    pub fn new(output_filename: impl Into<String>, input_structure: Option<Structure>) -> Self {
        OpenmxParser {
            output_filename: output_filename.into(),
            input_structure,
        }
    }

    /// 解析取回的文件夹
    ///
    /// `md_type` 为输入中的 `MD.Type`；非 `NOMD` 时由最终坐标构造输出结构。
    pub fn parse(&self, retrieved: &dyn RetrievedFolder, md_type: &str) -> ParseResult<OpenmxParsed> {
        let names = retrieved
            .list_object_names()
            .map_err(|_| ExitCode::NoRetrievedFolder)?;
        if !names.iter().any(|n| *n == self.output_filename) {
            return Err(ExitCode::OutputStdoutMissing);
        }

        let text = retrieved
            .read_to_string(&self.output_filename)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExitCode::OutputStdoutMissing,
                _ => ExitCode::OutputStdoutRead,
            })?;

        let mut output = parse_stdout(&text)?;

        let structure = if md_type.eq_ignore_ascii_case("nomd") {
            None
        } else {
            self.build_structure(&mut output, md_type)
        };

        Ok(OpenmxParsed {
            parameters: output.to_parameters(),
            output,
            structure,
        })
    }

    fn build_structure(&self, output: &mut OpenmxOutput, md_type: &str) -> Option<Structure> {
        if output.final_positions.is_empty() {
            note_warning(output, "output_structure", "no final coordinates");
            return None;
        }

        let cell_changes = CELL_CHANGING_MD_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(md_type));
        let cell = if cell_changes {
            output.final_cell
        } else {
            self.input_structure
                .as_ref()
                .map(|s| s.cell.matrix)
                .or(output.final_cell)
        };
        let cell = match cell {
            Some(c) => c,
            None => {
                note_warning(output, "output_structure", "no cell vectors");
                return None;
            }
        };

        let mut structure = Structure::new(Lattice::from_vectors(cell));
        for atom in &output.final_positions {
            let symbol = self
                .input_structure
                .as_ref()
                .and_then(|s| s.get_kind(&atom.species))
                .map(|k| k.symbol.clone())
                .unwrap_or_else(|| atom.species.clone());
            structure.append_atom(Kind::new(atom.species.clone(), symbol), atom.position);
        }
        Some(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::MemoryFolder;

    const MINIMAL: &str = "\
  This calculation was performed by OpenMX Ver. 3.9
  using 4 MPI processes and 2 OpenMP threads.

*******************************************************
        Total energy (Hartree) at MD = 1
*******************************************************

  Uele.                          -3.889316117170
  Ukin.                           5.533759208065
  Utot.                          -7.359832331733
  Enpy.                          -7.359832331733
  Note:

  Uele:   band energy
";

    #[test]
    fn test_minimal_output() {
        let out = parse_stdout(MINIMAL).unwrap();
        assert_eq!(out.openmx_version.as_deref(), Some("3.9"));
        assert_eq!(out.mpi_procs, Some(4));
        assert_eq!(out.omp_threads, Some(2));
        assert_eq!(out.energies.u_tot, Some(-7.359832331733 * HARTREE_TO_EV));
        assert_eq!(out.energies.enthalpy, Some(-7.359832331733 * HARTREE_TO_EV));
        assert!(out.energies.u_hubbard.is_none());
        assert_eq!(out.energy_history.len(), 1);
        assert!(out.missing.contains(&"timing".to_string()));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_energy_description_lines_not_matched() {
        // `Note:` 之后的说明行不应覆盖数值
        let out = parse_stdout(MINIMAL).unwrap();
        assert_eq!(out.energies.u_band, Some(-3.889316117170 * HARTREE_TO_EV));
    }

    #[test]
    fn test_missing_energy_block_is_incomplete() {
        let text = "  This calculation was performed by OpenMX Ver. 3.9\n";
        assert_eq!(parse_stdout(text).unwrap_err(), ExitCode::OutputStdoutIncomplete);
        assert_eq!(parse_stdout("").unwrap_err(), ExitCode::OutputStdoutIncomplete);
    }

    #[test]
    fn test_energy_block_without_utot_is_incomplete() {
        let text = "Total energy (Hartree) at MD = 1\n\n  Uele.  -3.0\n";
        assert_eq!(parse_stdout(text).unwrap_err(), ExitCode::OutputStdoutIncomplete);
    }

    #[test]
    fn test_malformed_energy_block_is_parse_error() {
        let text = "Total energy (Hartree) at MD = 1\n\n  Utot.  -7.35983x\n  Note:\n";
        let code = parse_stdout(text).unwrap_err();
        assert_eq!(code, ExitCode::OutputStdoutParse);
        assert_eq!(code.status(), 311);
        assert!(!code.is_job_failure());
    }

    #[test]
    fn test_last_md_step_wins() {
        let text = format!(
            "{}\nTotal energy (Hartree) at MD = 2\n\n  Utot.  -7.5\n  Note:\n",
            MINIMAL
        );
        let out = parse_stdout(&text).unwrap();
        assert_eq!(out.energy_history.len(), 2);
        assert_eq!(out.energies.u_tot, Some(-7.5 * HARTREE_TO_EV));
        // 新的一步不含 Uele
        assert!(out.energies.u_band.is_none());
    }

    #[test]
    fn test_malformed_optional_section_warns() {
        let text = format!(
            "{}\n***\n Dipole moment (Debye)\n***\n\n Absolute D   abc\n***\n",
            MINIMAL
        );
        let out = parse_stdout(&text).unwrap();
        assert!(out.dipole.is_none());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("dipole:"));
    }

    #[test]
    fn test_section_body_bounds() {
        let lines = vec!["***", "Marker", "*****", "", "row 1", "row 2", "*****", "after"];
        assert_eq!(section_body(&lines, 1), &["row 1", "row 2"]);
        assert!(section_body(&lines, 7).is_empty());
    }

    #[test]
    fn test_parser_exit_codes() {
        let parser = OpenmxParser::new("aiida.out", None);

        let empty = MemoryFolder::new();
        assert_eq!(
            parser.parse(&empty, "nomd").unwrap_err(),
            ExitCode::OutputStdoutMissing
        );

        let truncated = MemoryFolder::new().with_file("aiida.out", "OpenMX Ver. 3.9\n");
        assert_eq!(
            parser.parse(&truncated, "nomd").unwrap_err(),
            ExitCode::OutputStdoutIncomplete
        );

        let ok = MemoryFolder::new().with_file("aiida.out", MINIMAL);
        let parsed = parser.parse(&ok, "NOMD").unwrap();
        assert!(parsed.structure.is_none());
        assert!(parsed.parameters.contains_key("u_tot"));
    }
}
