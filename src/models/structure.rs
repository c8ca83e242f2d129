//! # 晶体结构数据模型
//!
//! 与宿主框架 `StructureData` 对应的结构表示：晶格 + 种类 (kind) + 原子位点。
//! 位点坐标为笛卡尔坐标 (Å)，与 OpenMX `Atoms.SpeciesAndCoordinates.Unit Ang` 一致。
//!
//! ## 依赖关系
//! - 被 `input/`, `calculations/`, `parsers/openmx_out.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let cos_gamma = gamma.to_radians().cos();
        let sin_gamma = gamma.to_radians().sin();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(&a_vec);
        let b = norm(&b_vec);
        let c = norm(&c_vec);

        let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（带符号的行列式）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 晶格是否退化（体积近零）
    pub fn is_singular(&self) -> bool {
        self.volume().abs() < 1e-10
    }

    /// 笛卡尔坐标 -> 分数坐标
    ///
    /// 奇异晶格返回 `None`。
    pub fn to_fractional(&self, cart: [f64; 3]) -> Option<[f64; 3]> {
        let m = self.matrix;
        let det = self.volume();
        if det.abs() < 1e-10 {
            return None;
        }

        // frac = cart · M^-1 （行向量约定）
        let inv = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
            ],
        ];

        let p = cart;
        Some([
            p[0] * inv[0][0] + p[1] * inv[1][0] + p[2] * inv[2][0],
            p[0] * inv[0][1] + p[1] * inv[1][1] + p[2] * inv[2][1],
            p[0] * inv[0][2] + p[1] * inv[1][2] + p[2] * inv[2][2],
        ])
    }
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// 原子种类：名称可与元素符号不同（如 `Fe1`, `Fe2`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kind {
    pub name: String,
    pub symbol: String,
}

impl Kind {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Kind {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// 原子位点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// 种类名称
    pub kind_name: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Site {
    pub fn new(kind_name: impl Into<String>, position: [f64; 3]) -> Self {
        Site {
            kind_name: kind_name.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// 晶格
    pub cell: Lattice,

    /// 种类列表（顺序即 `Definition.of.Atomic.Species` 的顺序）
    pub kinds: Vec<Kind>,

    /// 位点列表（顺序即 `Atoms.SpeciesAndCoordinates` 的顺序）
    pub sites: Vec<Site>,
}

impl Structure {
    pub fn new(cell: Lattice) -> Self {
        Structure {
            cell,
            kinds: Vec::new(),
            sites: Vec::new(),
        }
    }

    /// 追加原子，必要时自动注册种类
    pub fn append_atom(&mut self, kind: Kind, position: [f64; 3]) {
        if self.get_kind(&kind.name).is_none() {
            self.kinds.push(kind.clone());
        }
        self.sites.push(Site::new(kind.name, position));
    }

    /// 所有种类名称
    pub fn kind_names(&self) -> Vec<&str> {
        self.kinds.iter().map(|k| k.name.as_str()).collect()
    }

    /// 按名称查找种类
    pub fn get_kind(&self, name: &str) -> Option<&Kind> {
        self.kinds.iter().find(|k| k.name == name)
    }

    /// 计算化学式（按元素符号计数）
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for site in &self.sites {
            let symbol = self
                .get_kind(&site.kind_name)
                .map(|k| k.symbol.as_str())
                .unwrap_or(site.kind_name.as_str());
            *counts.entry(symbol).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silicon() -> Structure {
        let mut s = Structure::new(Lattice::from_vectors([
            [0.0, 2.7155, 2.7155],
            [2.7155, 0.0, 2.7155],
            [2.7155, 2.7155, 0.0],
        ]));
        s.append_atom(Kind::new("Si", "Si"), [0.0, 0.0, 0.0]);
        s.append_atom(Kind::new("Si", "Si"), [1.35775, 1.35775, 1.35775]);
        s
    }

    #[test]
    fn test_lattice_from_parameters_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_volume_fcc() {
        // 面心立方原胞体积 = a^3 / 4, a = 5.431
        let vol = silicon().cell.volume().abs();
        assert!((vol - 5.431_f64.powi(3) / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_hexagonal() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let (_, _, c, _, _, gamma) = lattice.parameters();

        assert!((c - 5.0).abs() < 0.01);
        assert!((gamma - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_to_fractional() {
        let s = silicon();
        let frac = s.cell.to_fractional(s.sites[1].position).unwrap();
        for x in frac {
            assert!((x - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_singular_lattice() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(lattice.is_singular());
        assert!(lattice.to_fractional([0.5, 0.5, 0.5]).is_none());
    }

    #[test]
    fn test_append_atom_registers_kind_once() {
        let s = silicon();
        assert_eq!(s.kinds.len(), 1);
        assert_eq!(s.sites.len(), 2);
        assert_eq!(s.formula(), "Si2");
    }

    #[test]
    fn test_formula_uses_symbol_not_kind_name() {
        let mut s = Structure::new(Lattice::from_parameters(3.0, 3.0, 3.0, 90.0, 90.0, 90.0));
        s.append_atom(Kind::new("Fe1", "Fe"), [0.0, 0.0, 0.0]);
        s.append_atom(Kind::new("Fe2", "Fe"), [1.5, 1.5, 1.5]);
        assert_eq!(s.kind_names(), vec!["Fe1", "Fe2"]);
        assert_eq!(s.formula(), "Fe2");
    }
}
