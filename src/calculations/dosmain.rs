//! # DosMain 后处理作业
//!
//! DosMain 读取 OpenMX 写出的 `aiida.Dos.val` / `aiida.Dos.vec`，
//! 通过标准输入交互选择展宽方法与 DOS/PDOS。这里把这些回答写入 `aiida.in`，
//! 并把两个输入文件从 OpenMX 的远程工作目录符号链接过来。
//!
//! ## 依赖关系
//! - 被 `workflows/dos.rs`, `commands/dosmain.rs`, `parsers/dos.rs` 使用
//! - 使用 `calculations/openmx.rs`, `models/structure.rs`

use super::openmx::{DOS_VAL_FILENAME, DOS_VEC_FILENAME};
use super::{write_file, CalcInfo, CodeInfo, RemoteFolder, RemoteLink};
use crate::error::{OmxError, Result};
use crate::input::SYSTEM_NAME;
use crate::models::Structure;

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// DosMain 标准输入文件
pub const INPUT_FILE: &str = "aiida.in";
/// DosMain 标准输出文件
pub const OUTPUT_FILE: &str = "aiida.out";

/// 总态密度或投影态密度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DosType {
    Dos,
    Pdos,
}

/// 态密度构造方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DosMethod {
    Tetrahedron,
    Gaussian,
}

impl DosMethod {
    /// 输出文件名中的方法名
    pub fn file_tag(&self) -> &'static str {
        match self {
            DosMethod::Tetrahedron => "Tetrahedron",
            DosMethod::Gaussian => "Gaussian",
        }
    }
}

impl FromStr for DosType {
    type Err = OmxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dos" => Ok(DosType::Dos),
            "pdos" => Ok(DosType::Pdos),
            other => Err(OmxError::InputValidation(format!(
                "`dos_type` should be `dos` or `pdos`, not `{}`",
                other
            ))),
        }
    }
}

impl FromStr for DosMethod {
    type Err = OmxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tetrahedron" => Ok(DosMethod::Tetrahedron),
            "gaussian" => Ok(DosMethod::Gaussian),
            other => Err(OmxError::InputValidation(format!(
                "`dos_method` should be `tetrahedron` or `gaussian`, not `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for DosType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DosType::Dos => write!(f, "dos"),
            DosType::Pdos => write!(f, "pdos"),
        }
    }
}

impl fmt::Display for DosMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_tag().to_lowercase())
    }
}

/// DosMain 作业输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosmainInputs {
    pub dos_type: DosType,
    pub dos_method: DosMethod,
    /// 高斯展宽 (eV)，仅 `gaussian` 使用
    #[serde(default)]
    pub gaussian_broadening: Option<f64>,
    /// 投影原子序号（1 起，与输入文件一致），仅 `pdos` 使用
    #[serde(default)]
    pub pdos_atom_indices: Option<Vec<usize>>,
    /// 已完成 OpenMX 计算（`Dos.fileout on`）的远程目录
    pub openmx_output_folder: RemoteFolder,
    #[serde(default)]
    pub openmx_input_structure: Option<Structure>,
    /// 种类名称 -> 轨道配置
    #[serde(default)]
    pub openmx_orbital_configurations: Option<BTreeMap<String, Vec<u32>>>,
}

/// DosMain 计算作业
#[derive(Debug, Clone)]
pub struct DosmainCalculation {
    pub inputs: DosmainInputs,
}

impl DosmainCalculation {
    pub fn new(inputs: DosmainInputs) -> Self {
        DosmainCalculation { inputs }
    }

    /// 提交前检查输入组合
    pub fn validate(&self) -> Result<()> {
        let inputs = &self.inputs;

        if inputs.dos_method == DosMethod::Gaussian {
            match inputs.gaussian_broadening {
                Some(b) if b > 0.0 && b.is_finite() => {}
                Some(b) => {
                    return Err(OmxError::InputValidation(format!(
                        "`gaussian_broadening` must be positive, got {}",
                        b
                    )))
                }
                None => {
                    return Err(OmxError::InputValidation(
                        "`gaussian_broadening` must be provided if `dos_method` is `gaussian`"
                            .to_string(),
                    ))
                }
            }
        }

        if inputs.dos_type == DosType::Pdos {
            let indices = inputs.pdos_atom_indices.as_ref().ok_or_else(|| {
                required_for_pdos("pdos_atom_indices")
            })?;
            let structure = inputs
                .openmx_input_structure
                .as_ref()
                .ok_or_else(|| required_for_pdos("openmx_input_structure"))?;
            if inputs.openmx_orbital_configurations.is_none() {
                return Err(required_for_pdos("openmx_orbital_configurations"));
            }

            if indices.is_empty() {
                return Err(OmxError::InputValidation(
                    "`pdos_atom_indices` must not be empty".to_string(),
                ));
            }
            let n_sites = structure.sites.len();
            if let Some(bad) = indices.iter().find(|&&i| i == 0 || i > n_sites) {
                return Err(OmxError::InputValidation(format!(
                    "atom index {} is outside 1..={}",
                    bad, n_sites
                )));
            }
        }

        Ok(())
    }

    /// DosMain 标准输入的回答序列
    pub fn stdin_content(&self) -> String {
        let inputs = &self.inputs;
        let mut content = String::new();

        match inputs.dos_method {
            DosMethod::Tetrahedron => content.push_str("1\n"),
            DosMethod::Gaussian => {
                content.push_str("2\n");
                let broadening = inputs.gaussian_broadening.unwrap_or_default();
                content.push_str(&format!("{:.12}\n", broadening));
            }
        }

        match inputs.dos_type {
            DosType::Dos => content.push_str("1\n"),
            DosType::Pdos => {
                content.push_str("2\n");
                let indices = inputs
                    .pdos_atom_indices
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                content.push_str(&indices);
                content.push('\n');
            }
        }

        content
    }

    /// DosMain 将写出的结果文件名
    pub fn output_filenames(&self) -> Vec<String> {
        dos_output_filenames(
            self.inputs.dos_type,
            self.inputs.dos_method,
            self.inputs.pdos_atom_indices.as_deref().unwrap_or_default(),
        )
    }

    /// 在 `folder` 中准备作业
    pub fn prepare_for_submission(&self, folder: &Path) -> Result<CalcInfo> {
        self.validate()?;
        if !folder.is_dir() {
            return Err(OmxError::DirectoryNotFound {
                path: folder.display().to_string(),
            });
        }

        write_file(folder, INPUT_FILE, &self.stdin_content())?;

        let remote = &self.inputs.openmx_output_folder;
        let remote_symlink_list = [DOS_VAL_FILENAME, DOS_VEC_FILENAME]
            .iter()
            .map(|name| RemoteLink {
                computer: remote.computer.clone(),
                source: remote.path.join(name),
                target: name.to_string(),
            })
            .collect();

        let code = CodeInfo {
            cmdline_params: vec![DOS_VAL_FILENAME.to_string(), DOS_VEC_FILENAME.to_string()],
            stdin_name: Some(INPUT_FILE.to_string()),
            stdout_name: OUTPUT_FILE.to_string(),
            with_mpi: true,
        };

        let mut retrieve_list = self.output_filenames();
        retrieve_list.push(OUTPUT_FILE.to_string());

        info!(
            "Prepared DosMain job ({}, {}) in {}",
            self.inputs.dos_type,
            self.inputs.dos_method,
            folder.display()
        );

        Ok(CalcInfo {
            codes_info: vec![code],
            local_copy_list: Vec::new(),
            remote_symlink_list,
            retrieve_list,
        })
    }
}

fn required_for_pdos(name: &str) -> OmxError {
    OmxError::InputValidation(format!("`{}` must be provided if `dos_type` is `pdos`", name))
}

/// DOS/PDOS 输出文件名
///
/// DOS 为 `aiida.DOS.<Method>`，PDOS 为每个原子一个 `aiida.PDOS.<Method>.atom<i>`。
pub fn dos_output_filenames(dos_type: DosType, method: DosMethod, atoms: &[usize]) -> Vec<String> {
    match dos_type {
        DosType::Dos => vec![format!("{}.DOS.{}", SYSTEM_NAME, method.file_tag())],
        DosType::Pdos => atoms
            .iter()
            .map(|i| format!("{}.PDOS.{}.atom{}", SYSTEM_NAME, method.file_tag(), i))
            .collect(),
    }
}
