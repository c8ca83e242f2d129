//! # OpenMX 关键字注册表
//!
//! 插件识别的全部 OpenMX 输入关键字，及其值类型、数值范围、可选值与依赖条件。
//! 未登记类型的关键字 (`ValueKind::Any`) 只做 JSON 形状检查。
//!
//! 关键字可以写成 OpenMX 原生形式 (`scf.energycutoff`) 或大写下划线形式
//! (`SCF_ENERGYCUTOFF`)，比较时忽略大小写并视 `.` 与 `_` 等价。
//!
//! ## 依赖关系
//! - 被 `input/validate.rs`, `input/writer.rs` 使用
//! - 无外部模块依赖

/// 关键字值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    /// 定长整数向量，写在同一行
    IntVec(usize),
    Any,
}

/// 单个关键字的描述
#[derive(Debug, Clone, Copy)]
pub struct Keyword {
    /// OpenMX 原生写法
    pub name: &'static str,
    pub kind: ValueKind,
    /// 闭区间数值范围
    pub lims: Option<(f64, f64)>,
    /// 可选值（忽略大小写）
    pub available: &'static [&'static str],
    /// 设置本关键字时必须同时满足的 (关键字, 渲染值)
    pub requires: &'static [(&'static str, &'static str)],
}

const fn kw(name: &'static str, kind: ValueKind) -> Keyword {
    Keyword {
        name,
        kind,
        lims: None,
        available: &[],
        requires: &[],
    }
}

const fn any(name: &'static str) -> Keyword {
    kw(name, ValueKind::Any)
}

use ValueKind::{Bool, Float, Int, IntVec, Str};

const INF: f64 = f64::INFINITY;

const HUBBARD_ON: &[(&str, &str)] = &[("scf.Hubbard.U", "on")];
const DFTU_GENERAL: &[(&str, &str)] = &[("scf.Hubbard.U", "on"), ("scf.DFTU.Type", "2")];

/// OpenMX 支持的交换关联泛函
pub const XC_TYPES: &[&str] = &["LDA", "LSDA-CA", "LSDA-PW", "GGA-PBE"];

const MD_TYPES: &[&str] = &[
    "NOMD", "NVE", "NVT_VS", "Opt", "EF", "BFGS", "RF", "DIIS", "NVT_NH", "Opt_LBFGS", "NVT_VS2",
    "EvsLC", "NEB", "NVT_VS4", "NVT_Langevin", "DF", "OptC1", "OptC2", "OptC3", "OptC4", "OptC5",
    "RFC1", "RFC2", "RFC3", "RFC4", "RFC5", "NPT_VS_PR", "NPT_VS_WV", "NPT_NH_PR", "NPT_NH_WV",
    "RFC6", "RFC7", "OptC6", "OptC7",
];

/// 由结构、赝势、基组、k 点自动生成或由作业流程管理的关键字，用户不得设置
pub const RESERVED: &[&str] = &[
    "System.CurrentDirectory",
    "System.Name",
    "DATA.PATH",
    "level.of.stdout",
    "level.of.fileout",
    "Species.Number",
    "Definition.of.Atomic.Species",
    "scf.XcType",
    "scf.Kgrid",
    "Atoms.Number",
    "Atoms.SpeciesAndCoordinates.Unit",
    "Atoms.SpeciesAndCoordinates",
    "Atoms.UnitVectors.Unit",
    "Atoms.UnitVectors",
    "Atoms.NetCharge",
    "scf.restart",
    "scf.restart.filename",
    "DosGauss.fileout",
    "FermiSurfer.fileout",
    "HS.fileout",
];

/// 关键字注册表
pub static KEYWORDS: &[Keyword] = &[
    kw("System.CurrentDirectory", Str),
    kw("System.Name", Str),
    kw("DATA.PATH", Str),
    Keyword { lims: Some((1.0, 3.0)), ..kw("level.of.stdout", Int) },
    Keyword { lims: Some((0.0, 3.0)), ..kw("level.of.fileout", Int) },
    kw("memory.usage.fileout", Bool),
    kw("scf.ProExpn.VNA", Bool),
    kw("scf.BufferL.VNA", Int),
    kw("scf.RadialF.VNA", Int),
    kw("scf.energycutoff", Float),
    kw("scf.MPI.tuned.grids", Bool),
    kw("scf.Ngrid", IntVec(3)),
    kw("Species.Number", Int),
    kw("scf.Hubbard.U", Bool),
    Keyword { lims: Some((1.0, 2.0)), requires: HUBBARD_ON, ..kw("scf.DFTU.Type", Int) },
    Keyword { requires: HUBBARD_ON, ..kw("scf.Yukawa", Bool) },
    Keyword {
        available: &["sFLL", "sAMF", "cFLL", "cAMF"],
        requires: DFTU_GENERAL,
        ..kw("scf.dc.Type", Str)
    },
    Keyword { requires: DFTU_GENERAL, ..kw("scf.Slater.Ratio", Float) },
    Keyword { available: &["DUAL", "ONSITE", "FULL"], ..kw("scf.Hubbard.Occupation", Str) },
    Keyword {
        available: &["OFF", "Atoms", "Species", "Atoms2", "Species2"],
        ..kw("orbitalOpt.Method", Str)
    },
    any("Definition.of.Atomic.Species"),
    Keyword { available: MD_TYPES, ..kw("MD.Type", Str) },
    Keyword { lims: Some((1.0, INF)), ..kw("MD.maxIter", Int) },
    kw("MD.Current.Iter", Int),
    Keyword { lims: Some((0.0, INF)), ..kw("MD.TimeStep", Float) },
    kw("MD.Opt.criterion", Float),
    Keyword { lims: Some((0.0, 19.0)), ..kw("MD.Opt.DIIS.History", Int) },
    kw("MD.Opt.StartDIIS", Int),
    kw("MD.Opt.EveryDIIS", Int),
    kw("MD.EvsLC.Step", Float),
    kw("MD.EvsLC.flag", IntVec(3)),
    kw("MD.Out.ABC", Bool),
    Keyword { available: &["Schlegel", "iden", "FF"], ..kw("MD.Opt.Init.Hessian", Str) },
    any("MD.TempControl"),
    any("MD.CellPressureControl"),
    kw("NH.Mass.HeatBath", Float),
    kw("NPT.Mass.Barostat", Float),
    kw("MD.TempTolerance", Float),
    Keyword { available: &["none", "cubic", "ortho"], ..kw("NPT.LatticeRestriction", Str) },
    kw("Langevin.Friction.Factor", Float),
    any("NPT.WV.F0"),
    kw("LNO.flag", Bool),
    Keyword {
        available: &[
            "Cluster", "Band", "NEGF", "DC", "Cluster-DIIS", "Krylov", "Cluster2", "EGAC",
            "DC-LNO", "Cluster-LNO",
        ],
        ..kw("scf.EigenvalueSolver", Str)
    },
    Keyword {
        available: &["dstevx", "dstegr", "dstedc", "dsteqr"],
        ..kw("scf.lapack.dste", Str)
    },
    Keyword { available: &["elpa1", "lapack", "elpa2"], ..kw("scf.eigen.lib", Str) },
    kw("scf.dclno.threading", Bool),
    kw("scf.MP.criterion", Float),
    Keyword { available: &["REGULAR", "MP"], ..kw("scf.Generation.Kpoint", Str) },
    kw("FT.files.save", Bool),
    kw("FT.files.read", Bool),
    Keyword { available: XC_TYPES, ..kw("scf.XcType", Str) },
    any("scf.SpinPolarization"),
    any("scf.Constraint.NC.Spin"),
    any("scf.Constraint.NC.Spin.V"),
    any("scf.SpinOrbit.Coupling"),
    any("scf.SO.factor"),
    any("scf.partialCoreCorrection"),
    any("scf.pcc.opencore"),
    any("scf.NC.Zeeman.Spin"),
    any("scf.NC.Mag.Field.Spin"),
    any("scf.NC.Zeeman.Orbital"),
    any("scf.NC.Mag.Field.Orbital"),
    kw("scf.Kgrid", IntVec(3)),
    Keyword { lims: Some((0.0, INF)), ..kw("scf.ElectronicTemperature", Float) },
    any("scf.Mixing.Type"),
    any("scf.Mixing.Control.Temp"),
    Keyword { lims: Some((0.0, INF)), ..kw("scf.criterion", Float) },
    any("scf.system.charge"),
    kw("CDDF.start", Bool),
    kw("CDDF.FWHM", Float),
    kw("CDDF.maximum_energy", Float),
    kw("CDDF.minimum_energy", Float),
    any("CDDF.additional_maximum_energy"),
    any("CDDF.frequency.grid.total_number"),
    any("CDDF.maximum_unoccupied_state"),
    any("CDDF.material_type"),
    any("ESM.switch"),
    any("ESM.wall.switch"),
    any("ESM.direction"),
    any("ESM.potential.diff"),
    any("ESM.wall.position"),
    any("ESM.wall.eight"),
    any("ESM.buffer.range"),
    any("MD.Artificial_Force"),
    any("MD.Artifical_Grad"),
    any("geoopt.restart"),
    any("Atoms.Number"),
    any("Atoms.SpeciesAndCoordinates.Unit"),
    any("Atoms.SpeciesAndCoordinates"),
    any("Atoms.UnitVectors.Unit"),
    any("Atoms.UnitVectors"),
    any("Atoms.Unitvectors.Velocity"),
    any("orderN.LNO.Occ.Cutoff"),
    any("orderN.LNO.Buffer"),
    any("LNOs.Num"),
    any("scf.core.hole"),
    any("scf.coulomb.cutoff"),
    any("CLE.Type"),
    any("CLE.Val.Window"),
    any("CLE.Con.Window"),
    any("scf.dftD"),
    any("version.dftD"),
    any("DFTD.Unit"),
    any("DFTD.rcut_dftD"),
    any("DFTD.d"),
    any("DFTD.scale6"),
    any("DFTD.InDirection"),
    any("DFTD.periodicity"),
    any("DFTD3.damp"),
    any("DFTD.sr6"),
    any("DFTD.a1"),
    any("DFTD.a2"),
    any("DFTD.scale8"),
    any("DFTD.cncut_dftD"),
    any("MD.Fixed.Cell.Vectors"),
    any("MD.Fixed.XYZ"),
    any("MD.Init.Velocity"),
    any("MD.Init.Velocity.Prev"),
    any("NH.R"),
    any("NH.nzeta"),
    any("NH.czeta"),
    any("MD.num.AtomGroup"),
    any("Hubbard.U.values"),
    any("Hund.J.values"),
    Keyword { lims: Some((1.0, INF)), ..kw("scf.maxIter", Int) },
    any("scf.Npoles.ON2"),
    any("scf.Npoles.EGAC"),
    any("scf.DIIS.History.EGAC"),
    any("scf.AC.flag.EGAC"),
    any("scf.GF.EGAC"),
    any("Atoms.NetCharge"),
    any("scf.restart"),
    any("scf.restart.filename"),
    any("scf.Restart.Spin.Angle.Theta"),
    any("scf.Restart.Spin.Angle.Phi"),
    any("scf.Generalized.Bloch"),
    any("Spin.Spiral.Vector"),
    any("Band.dispersion"),
    any("Band.Nkpath"),
    any("Band.kpath.UnitCell"),
    any("Band.kpath"),
    any("1DFFT.NumGridK"),
    any("1DFFT.EnergyCutoff"),
    any("1DFFT.NumGridR"),
    any("orbitalOpt.InitCoes"),
    any("orbitalOpt.scf.maxIter"),
    any("orbitalOpt.Opt.MaxIter"),
    any("orbitalOpt.per.MDIter"),
    any("orbitalOpt.criterion"),
    any("orbitalOpt.SD.step"),
    any("orbitalOpt.HistoryPulay"),
    any("orbitalOpt.StartPulay"),
    any("orbitalOpt.Force.Skip"),
    any("orbitalOpt.Opt.Method"),
    any("orderN.HoppingRanges"),
    any("orderN.NumHoppings"),
    any("orderN.EC.Sub.Dim"),
    any("orderN.KrylovH.order"),
    any("orderN.KrylovS.order"),
    any("orderN.Recalc.Buffer"),
    any("orderN.Exact.Inverse.S"),
    any("orderN.Expand.Core"),
    any("orderN.Inverse.S"),
    any("orderN.FNAN.SNAN"),
    any("orderN.RecursiveLevels"),
    any("orderN.TerminatorType"),
    any("orderN.InverseSolver"),
    any("orderN.InvRecursiveLevels"),
    any("orderN.ChargeDeviation"),
    any("orderN.InitChemPot"),
    any("orderN.AvNumTerminater"),
    any("orderN.NumPoles"),
    any("MO.fileout"),
    any("num.HOMOs"),
    any("num.LUMOs"),
    any("MO.Nkpoint"),
    any("MO.kpoint"),
    any("NBO.switch"),
    any("NAO.only"),
    any("NAO.threshold"),
    any("NBO.Num.CenterAtoms"),
    any("NBO.CenterAtoms"),
    any("NHO.fileout"),
    any("NBO.fileout"),
    any("NBO.SmallCell.Switch"),
    any("NBO.SmallCell"),
    any("Unfolding.Electronic.Band"),
    any("Unfolding.Reference.Vectors"),
    any("Unfolding.Referenceorigin"),
    any("Unfolding.LowerBound"),
    any("Unfolding.UpperBound"),
    any("Unfolding.Map"),
    any("Unfolding.Nkpoint"),
    any("Unfolding.desired_totalnkpt"),
    any("Unfolding.kpoint"),
    any("empty.occupation.flag"),
    any("empty.occupation.number"),
    any("empty.occupation.orbitals"),
    any("empty.states.flag"),
    any("empty.states.orbitals"),
    any("OutData.bin.flag"),
    any("CntOrb.fileout"),
    any("Num.CntOrb.Atoms"),
    any("Atoms.Cont.Orbitals"),
    any("scf.ElectricField"),
    kw("Dos.fileout", Bool),
    kw("DosGauss.fileout", Bool),
    any("DosGauss.Num.Mesh"),
    any("DosGauss.Width"),
    any("FermiSurfer.fileout"),
    any("Dos.Erange"),
    kw("Dos.Kgrid", IntVec(3)),
    any("partial.charge"),
    any("partial.charge.energy.window"),
    any("HS.fileout"),
    any("Energy.Decomposition"),
    any("Voronoi.charge"),
    any("Voronoi.orbital.moment"),
    any("Wannier.Func.Calc"),
    any("Wannier90.fileout"),
    any("Wannier.Func.Num"),
    any("Wannier.Outer.Window.Bottom"),
    any("Wannier.Outer.Window.Top"),
    any("Wannier.Inner.Window.Bottom"),
    any("Wannier.Inner.Window.Top"),
    any("Wannier.Initial.Guess"),
    any("Wannier.Initial.Projectors.Unit"),
    any("Wannier.Initial.Projectors"),
    any("Wannier.Kgrid"),
    any("Wannier.MaxShells"),
    any("Wannier.Minimizing.Max.Steps"),
    any("Wannier.Function.Plot"),
    any("Wannier.Function.Plot.SuperCells"),
    any("Wannier.Dis.Mixing.Para"),
    any("Wannier.Dis.Conv.Criterion"),
    any("Wannier.Dis.SCF.Max.Steps"),
    any("Wannier.Minimizing.Scheme"),
    any("Wannier.Minimizing.StepLength"),
    any("Wannier.Minimizing.Secant.Steps"),
    any("Wannier.Minimizing.Secant.StepLength"),
    any("Wannier.Minimizing.Conv.Criterion"),
    any("Wannier.Output.kmesh"),
    any("Wannier.Readin.Overlap.Matrix"),
    any("scf.stress.tensor"),
    any("MD.applied.pressure"),
    any("MD.applied.pressure.flag"),
    any("Population.Analysis.AO.Wanniers"),
];

/// 关键字归一化：大写，`.` 视为 `_`
pub fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase().replace('.', "_")
}

/// 按任意写法查找关键字
pub fn lookup(key: &str) -> Option<&'static Keyword> {
    let wanted = normalize_key(key);
    KEYWORDS.iter().find(|k| normalize_key(k.name) == wanted)
}

/// 是否为保留关键字
pub fn is_reserved(key: &str) -> bool {
    let wanted = normalize_key(key);
    RESERVED.iter().any(|r| normalize_key(r) == wanted)
}

/// 查找 OpenMX 接受的交换关联类型（忽略大小写），返回规范写法
pub fn known_xc_type(xc: &str) -> Option<&'static str> {
    XC_TYPES.iter().copied().find(|x| x.eq_ignore_ascii_case(xc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_both_spellings() {
        let k = lookup("SCF_ENERGYCUTOFF").unwrap();
        assert_eq!(k.name, "scf.energycutoff");
        assert_eq!(k.kind, ValueKind::Float);

        let k = lookup("dos.fileout").unwrap();
        assert_eq!(k.name, "Dos.fileout");
        assert!(lookup("NOT_A_KEYWORD").is_none());
    }

    #[test]
    fn test_reserved_keywords_are_registered() {
        for r in RESERVED {
            assert!(lookup(r).is_some(), "{} missing from registry", r);
            assert!(is_reserved(&normalize_key(r)));
        }
        assert!(!is_reserved("Dos.fileout"));
    }

    #[test]
    fn test_managed_file_keywords_reserved() {
        for key in [
            "ATOMS_NETCHARGE",
            "scf.restart",
            "SCF_RESTART_FILENAME",
            "DosGauss.fileout",
            "FermiSurfer.fileout",
            "hs.fileout",
        ] {
            assert!(is_reserved(key), "{} should be reserved", key);
        }
        assert!(!is_reserved("scf.maxIter"));
        assert!(!is_reserved("MD.Type"));
    }

    #[test]
    fn test_registry_has_no_duplicates() {
        let mut seen = HashSet::new();
        for k in KEYWORDS {
            assert!(seen.insert(normalize_key(k.name)), "duplicate {}", k.name);
        }
    }

    #[test]
    fn test_requires_targets_exist() {
        for k in KEYWORDS {
            for (dep, _) in k.requires {
                assert!(lookup(dep).is_some(), "{} requires unknown {}", k.name, dep);
            }
        }
    }

    #[test]
    fn test_xc_types() {
        assert_eq!(known_xc_type("GGA-PBE"), Some("GGA-PBE"));
        assert!(known_xc_type("lda").is_some());
        assert!(known_xc_type("PBEsol").is_none());
    }
}
