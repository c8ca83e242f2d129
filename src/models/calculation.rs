//! # OpenMX 计算结果数据模型
//!
//! 存储从 OpenMX 标准输出提取的信息。所有字段可选：解析失败的小节留空，
//! 并在 `missing` / `warnings` 中说明。
//!
//! ## 依赖关系
//! - 被 `parsers/openmx_out.rs` 填充
//! - 被 `commands/parse.rs`, `commands/collect.rs`, `workflows/` 使用

use crate::models::units::*;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// 总能及其分量 (eV)，取最后一个 MD 步
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyTerms {
    pub u_band: Option<f64>,
    pub u_kinetic: Option<f64>,
    pub u_e_screened_coulomb: Option<f64>,
    pub u_ee_coulomb: Option<f64>,
    pub u_neutral_atom: Option<f64>,
    pub u_non_local: Option<f64>,
    pub u_xc_alpha: Option<f64>,
    pub u_xc_beta: Option<f64>,
    pub u_core_core_coulomb: Option<f64>,
    pub u_hubbard: Option<f64>,
    pub u_spin_constraint: Option<f64>,
    pub u_zeeman_spin_mag: Option<f64>,
    pub u_zeeman_spin_orb: Option<f64>,
    pub u_e_field: Option<f64>,
    pub u_vdw: Option<f64>,
    pub u_core_hole: Option<f64>,
    pub u_tot: Option<f64>,
    pub u_press_vol: Option<f64>,
    pub enthalpy: Option<f64>,
}

impl EnergyTerms {
    /// 按输出名称取可写字段
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        let slot = match name {
            "u_band" => &mut self.u_band,
            "u_kinetic" => &mut self.u_kinetic,
            "u_e_screened_coulomb" => &mut self.u_e_screened_coulomb,
            "u_ee_coulomb" => &mut self.u_ee_coulomb,
            "u_neutral_atom" => &mut self.u_neutral_atom,
            "u_non_local" => &mut self.u_non_local,
            "u_xc_alpha" => &mut self.u_xc_alpha,
            "u_xc_beta" => &mut self.u_xc_beta,
            "u_core_core_coulomb" => &mut self.u_core_core_coulomb,
            "u_hubbard" => &mut self.u_hubbard,
            "u_spin_constraint" => &mut self.u_spin_constraint,
            "u_zeeman_spin_mag" => &mut self.u_zeeman_spin_mag,
            "u_zeeman_spin_orb" => &mut self.u_zeeman_spin_orb,
            "u_e_field" => &mut self.u_e_field,
            "u_vdw" => &mut self.u_vdw,
            "u_core_hole" => &mut self.u_core_hole,
            "u_tot" => &mut self.u_tot,
            "u_press_vol" => &mut self.u_press_vol,
            "enthalpy" => &mut self.enthalpy,
            _ => return None,
        };
        Some(slot)
    }

    /// 所有已解析的 (名称, 值)
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        [
            ("u_band", self.u_band),
            ("u_kinetic", self.u_kinetic),
            ("u_e_screened_coulomb", self.u_e_screened_coulomb),
            ("u_ee_coulomb", self.u_ee_coulomb),
            ("u_neutral_atom", self.u_neutral_atom),
            ("u_non_local", self.u_non_local),
            ("u_xc_alpha", self.u_xc_alpha),
            ("u_xc_beta", self.u_xc_beta),
            ("u_core_core_coulomb", self.u_core_core_coulomb),
            ("u_hubbard", self.u_hubbard),
            ("u_spin_constraint", self.u_spin_constraint),
            ("u_zeeman_spin_mag", self.u_zeeman_spin_mag),
            ("u_zeeman_spin_orb", self.u_zeeman_spin_orb),
            ("u_e_field", self.u_e_field),
            ("u_vdw", self.u_vdw),
            ("u_core_hole", self.u_core_hole),
            ("u_tot", self.u_tot),
            ("u_press_vol", self.u_press_vol),
            ("enthalpy", self.enthalpy),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
        .collect()
    }
}

/// Kohn-Sham 本征值（最后一次 SCF）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eigenvalues {
    /// 化学势 (eV)
    pub e_fermi: f64,
    pub n_states: f64,
    /// 分数坐标 k 点
    pub k_points: Vec<[f64; 3]>,
    /// 自旋向上本征值 (eV)，按 k 点分组
    pub up: Vec<Vec<f64>>,
    /// 自旋向下本征值 (eV)
    pub down: Vec<Vec<f64>>,
}

/// 晶胞优化历史中的一步
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellOptStep {
    pub md_iter: usize,
    pub sd_scaling: f64,
    /// |最大力| (eV/Å)
    pub abs_max_force: f64,
    /// 最大步长 (Å)
    pub max_step: f64,
    /// (eV)
    pub u_tot: f64,
    /// (eV)
    pub enthalpy: f64,
    /// (Å^3)
    pub volume: f64,
}

/// 偶极矩 (Debye)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DipoleMoments {
    pub absolute: Option<f64>,
    pub total: Option<[f64; 3]>,
    pub core: Option<[f64; 3]>,
    pub electron: Option<[f64; 3]>,
    pub background: Option<[f64; 3]>,
}

/// 带种类标签的坐标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPosition {
    pub species: String,
    pub position: [f64; 3],
}

/// 单个例程的 MPI 进程计时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineTiming {
    pub min_id: usize,
    pub min_time: f64,
    pub max_id: usize,
    pub max_time: f64,
}

/// 计时信息 (s)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub elapsed_time: Option<f64>,
    pub routines: BTreeMap<String, RoutineTiming>,
}

/// OpenMX 标准输出解析结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenmxOutput {
    pub openmx_version: Option<String>,
    pub mpi_procs: Option<usize>,
    pub omp_threads: Option<usize>,

    /// 三个方向实际使用的截断能 (eV)
    pub true_scf_ecut: Option<[f64; 3]>,
    pub fft_grid: Option<[usize; 3]>,

    pub energies: EnergyTerms,
    /// 每个 MD 步的 Utot (eV)
    pub energy_history: Vec<f64>,

    pub bands: Option<Eigenvalues>,
    pub cell_opt_history: Vec<CellOptStep>,
    pub dipole: Option<DipoleMoments>,

    /// 最终晶格向量 (Å)
    pub final_cell: Option<[[f64; 3]; 3]>,
    /// dE/dcell (eV/Å)
    pub final_de_dcell: Option<[[f64; 3]; 3]>,
    /// 最终笛卡尔坐标 (Å)
    pub final_positions: Vec<LabeledPosition>,
    /// 最终原子受力 (eV/Å)
    pub final_forces: Vec<[f64; 3]>,
    pub final_fractional: Vec<LabeledPosition>,

    pub timing: Option<Timing>,

    /// 期望出现但未找到的字段
    pub missing: Vec<String>,
    /// 存在但格式异常的小节
    pub warnings: Vec<String>,
}

const UNITS_SUFFIX: &str = "_units";

impl OpenmxOutput {
    /// 展平为宿主框架的 `output_parameters` 字典
    ///
    /// 有物理单位的键附带 `<name>_units` 伴随键。
    pub fn to_parameters(&self) -> Map<String, Value> {
        let mut params = Map::new();

        let mut put = |key: &str, value: Value, units: Option<&str>| {
            params.insert(key.to_string(), value);
            if let Some(u) = units {
                params.insert(format!("{}{}", key, UNITS_SUFFIX), json!(u));
            }
        };

        if let Some(v) = &self.openmx_version {
            put("openmx_version", json!(v), None);
        }
        if let Some(n) = self.mpi_procs {
            put("mpi_procs", json!(n), None);
        }
        if let Some(n) = self.omp_threads {
            put("omp_threads", json!(n), None);
        }
        if let Some(ecut) = self.true_scf_ecut {
            put("true_scf_ecut", json!(ecut), Some(ENERGY_UNITS));
        }
        if let Some(grid) = self.fft_grid {
            put("3d_fft_grid", json!(grid), None);
        }
        for (name, value) in self.energies.entries() {
            put(name, json!(value), Some(ENERGY_UNITS));
        }
        if let Some(bands) = &self.bands {
            put("e_fermi", json!(bands.e_fermi), Some(ENERGY_UNITS));
            put("n_states", json!(bands.n_states), None);
        }
        if let Some(dipole) = &self.dipole {
            if let Some(d) = dipole.absolute {
                put("abs_dipole_mom", json!(d), Some(DIPOLE_UNITS));
            }
            for (name, vec) in [
                ("total_dipole", dipole.total),
                ("core_dipole", dipole.core),
                ("electron_dipole", dipole.electron),
                ("background_dipole", dipole.background),
            ] {
                if let Some(v) = vec {
                    put(name, json!(v), Some(DIPOLE_UNITS));
                }
            }
        }
        if let Some(de) = self.final_de_dcell {
            put("final_de_dcell", json!(de), Some(FORCE_UNITS));
        }
        if !self.final_forces.is_empty() {
            put("final_forces", json!(self.final_forces), Some(FORCE_UNITS));
        }
        if let Some(timing) = &self.timing {
            if let Some(t) = timing.elapsed_time {
                put("elapsed_time", json!(t), Some(TIME_UNITS));
            }
            for (name, routine) in &timing.routines {
                put(name, json!(routine), Some(TIME_UNITS));
            }
        }
        if !self.warnings.is_empty() {
            put("parser_warnings", json!(self.warnings), None);
        }

        params
    }

    /// 每原子总能 (eV)
    pub fn energy_per_atom(&self) -> Option<f64> {
        let n = self.final_positions.len();
        match (self.energies.u_tot, n) {
            (Some(e), n) if n > 0 => Some(e / n as f64),
            _ => None,
        }
    }
}
