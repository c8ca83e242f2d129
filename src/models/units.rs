//! # 单位换算常数
//!
//! OpenMX 以 Hartree / Bohr 输出，解析结果统一换算为 eV / Å。
//! 数值取 CODATA 2018。

/// Hartree -> eV
pub const HARTREE_TO_EV: f64 = 27.211386245988;

/// Rydberg -> eV
pub const RYDBERG_TO_EV: f64 = HARTREE_TO_EV / 2.0;

/// Bohr -> Å
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;

/// Hartree/Bohr -> eV/Å
pub const HARTREE_PER_BOHR_TO_EV_PER_ANGSTROM: f64 = HARTREE_TO_EV / BOHR_TO_ANGSTROM;

pub const ENERGY_UNITS: &str = "eV";
pub const FORCE_UNITS: &str = "eV/Å";
pub const LENGTH_UNITS: &str = "Å";
pub const VOLUME_UNITS: &str = "Å^3";
pub const DIPOLE_UNITS: &str = "Debye";
pub const TIME_UNITS: &str = "s";
