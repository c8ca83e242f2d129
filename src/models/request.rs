//! # 计算请求数据模型
//!
//! 宿主框架交给插件的一次 OpenMX 计算请求：结构、k 点网格、参数字典、
//! 各种类的赝势 (VPS) 与基组 (PAO) 文件引用，以及作业选项。
//! 请求一经构造即不再修改，渲染输入时只读访问。
//!
//! ## 依赖关系
//! - 被 `input/`, `calculations/openmx.rs`, `workflows/` 使用
//! - 使用 `models/structure.rs`

use crate::error::{OmxError, Result};
use crate::models::Structure;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 赝势文件引用（由赝势插件提供，内容不在本仓库解析）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudoFile {
    /// 文件名，如 `Si_PBE19.vps`
    pub filename: String,
    pub element: String,
    /// 交换关联泛函类型，如 `GGA-PBE`
    pub xc_type: String,
    /// 本地文件路径（用于拷贝到作业目录的 `VPS/`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// 轨道配置最多的角动量通道数 (s, p, d, f)
pub const MAX_ORBITAL_CHANNELS: usize = 4;

/// 赝原子轨道基组引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalBasis {
    /// 文件名，如 `Si7.0.pao`
    pub filename: String,
    pub element: String,
    /// 各角动量通道的轨道数 [s, p, d, f]
    pub orbital_configuration: Vec<u32>,
    /// 价电子数
    pub z_valence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl OrbitalBasis {
    /// 轨道配置字符串，如 [2, 2, 1] -> `s2p2d1`
    pub fn configuration_string(&self) -> String {
        const CHANNELS: [char; MAX_ORBITAL_CHANNELS] = ['s', 'p', 'd', 'f'];
        self.orbital_configuration
            .iter()
            .zip(CHANNELS.iter())
            .map(|(n, ch)| format!("{}{}", ch, n))
            .collect()
    }
}

/// 文件名去掉扩展名
pub fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// Monkhorst-Pack 风格的 k 点网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpointMesh {
    pub mesh: [u32; 3],
}

/// 作业元数据选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcOptions {
    pub input_filename: String,
    pub output_filename: String,
    pub withmpi: bool,
}

impl Default for CalcOptions {
    fn default() -> Self {
        CalcOptions {
            input_filename: "aiida.in".to_string(),
            output_filename: "aiida.out".to_string(),
            withmpi: true,
        }
    }
}

/// 一次 OpenMX 计算请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub structure: Structure,
    pub kpoints: KpointMesh,

    /// OpenMX 关键字 -> 值（`scf.energycutoff` 或 `SCF_ENERGYCUTOFF` 均可）
    pub parameters: BTreeMap<String, Value>,

    /// 影响作业准备与解析的可选设置
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,

    /// 种类名称 -> 赝势
    pub pseudos: BTreeMap<String, PseudoFile>,

    /// 种类名称 -> 基组
    pub orbitals: BTreeMap<String, OrbitalBasis>,

    #[serde(default)]
    pub options: CalcOptions,
}

impl CalculationRequest {
    /// 从 JSON 请求文件读取
    ///
    /// 赝势/基组的相对路径按请求文件所在目录解析。
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| OmxError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut request: CalculationRequest =
            serde_json::from_str(&content).map_err(|e| OmxError::ParseError {
                format: "request JSON".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if let Some(base) = path.parent() {
            request.resolve_paths(base);
        }

        Ok(request)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        };
        self.pseudos.values_mut().for_each(|ps| resolve(&mut ps.path));
        self.orbitals.values_mut().for_each(|orb| resolve(&mut orb.path));
    }
}
