//! # 数据模型模块
//!
//! 定义结构、计算请求与计算结果的数据模型。
//!
//! ## 依赖关系
//! - 被 `input/`, `calculations/`, `parsers/`, `workflows/`, `commands/` 使用
//! - 子模块: structure, request, calculation, units

pub mod calculation;
pub mod request;
pub mod structure;
pub mod units;

pub use calculation::{
    CellOptStep, DipoleMoments, EnergyTerms, Eigenvalues, LabeledPosition, OpenmxOutput,
    RoutineTiming, Timing,
};
pub use request::{
    CalcOptions, CalculationRequest, KpointMesh, OrbitalBasis, PseudoFile, MAX_ORBITAL_CHANNELS,
};
pub use structure::{Kind, Lattice, Site, Structure};
