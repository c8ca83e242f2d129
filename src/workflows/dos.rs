//! # DOS 工作流
//!
//! 先运行 OpenMX（要求 `Dos.fileout on`），成功后用其远程工作目录运行 DosMain，
//! 最后收集 OpenMX 的输出参数与 DosMain 的态密度表。
//! 任一步失败即以对应退出码结束，不做重试。
//!
//! ## 依赖关系
//! - 使用 `calculations/`, `parsers/dos.rs`, `input/keywords.rs`

use crate::calculations::{
    DosMethod, DosType, DosmainCalculation, DosmainInputs, OpenmxCalculation, RemoteFolder,
};
use crate::error::{ExitCode, Result};
use crate::input::dict::normalize_keys;
use crate::input::keywords::normalize_key;
use crate::models::CalculationRequest;
use crate::parsers::DosmainParsed;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 调用标签
pub const OPENMX_LABEL: &str = "openmx";
pub const DOSMAIN_LABEL: &str = "dosmain";

/// 宿主框架返回的已结束作业
#[derive(Debug, Clone, Default)]
pub struct CompletedCalc {
    /// 0 表示成功
    pub exit_status: u32,
    pub remote_folder: Option<RemoteFolder>,
    pub output_parameters: Option<Map<String, Value>>,
    pub output_dos: Option<DosmainParsed>,
}

impl CompletedCalc {
    pub fn is_finished_ok(&self) -> bool {
        self.exit_status == 0
    }
}

/// 提交作业并等待其结束
pub trait Launcher {
    fn run_openmx(&mut self, label: &str, calc: &OpenmxCalculation) -> Result<CompletedCalc>;
    fn run_dosmain(&mut self, label: &str, calc: &DosmainCalculation) -> Result<CompletedCalc>;
}

/// 暴露给工作流的 DosMain 输入（远程目录、结构、轨道配置由 OpenMX 步骤补全）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosmainOptions {
    pub dos_type: DosType,
    pub dos_method: DosMethod,
    #[serde(default)]
    pub gaussian_broadening: Option<f64>,
    #[serde(default)]
    pub pdos_atom_indices: Option<Vec<usize>>,
}

/// 工作流输出
#[derive(Debug, Clone)]
pub struct DosWorkflowOutputs {
    pub openmx_parameters: Map<String, Value>,
    pub dosmain_dos: DosmainParsed,
}

/// OpenMX + DosMain 工作流
#[derive(Debug, Clone)]
pub struct DosWorkflow {
    pub openmx: CalculationRequest,
    pub dosmain: DosmainOptions,
}

impl DosWorkflow {
    pub fn new(openmx: CalculationRequest, dosmain: DosmainOptions) -> Self {
        DosWorkflow { openmx, dosmain }
    }

    /// 检查 OpenMX 参数中打开了 `Dos.fileout`
    ///
    /// 参数键先按渲染时的规则归一化，重复写法在此报校验错误。
    pub fn validate(&self) -> Result<()> {
        let parameters = normalize_keys(&self.openmx.parameters, "parameters", normalize_key)?;
        let enabled = parameters
            .get(&normalize_key("Dos.fileout"))
            .map(|v| match v {
                Value::Bool(b) => *b,
                Value::String(s) => matches!(s.to_lowercase().as_str(), "on" | "true"),
                _ => false,
            })
            .unwrap_or(false);

        if enabled {
            Ok(())
        } else {
            Err(ExitCode::DosFileoutNotSpecified.into())
        }
    }

    /// 运行整个工作流
    pub fn run(&self, launcher: &mut dyn Launcher) -> Result<DosWorkflowOutputs> {
        self.validate()?;

        // OpenMX
        let openmx_calc = OpenmxCalculation::new(self.openmx.clone());
        info!("launching OpenmxCalculation<{}>", OPENMX_LABEL);
        let openmx = launcher.run_openmx(OPENMX_LABEL, &openmx_calc)?;
        let (remote_folder, openmx_parameters) = match (
            openmx.is_finished_ok(),
            openmx.remote_folder,
            openmx.output_parameters,
        ) {
            (true, Some(folder), Some(params)) => (folder, params),
            _ => {
                info!(
                    "OpenmxCalculation failed with exit status {}",
                    openmx.exit_status
                );
                return Err(ExitCode::SubprocessFailedOpenmx.into());
            }
        };

        // DosMain
        let dosmain_calc = DosmainCalculation::new(self.dosmain_inputs(remote_folder));
        info!("launching DosmainCalculation<{}>", DOSMAIN_LABEL);
        let dosmain = launcher.run_dosmain(DOSMAIN_LABEL, &dosmain_calc)?;
        let dosmain_dos = match (dosmain.is_finished_ok(), dosmain.output_dos) {
            (true, Some(dos)) => dos,
            _ => {
                info!(
                    "DosmainCalculation failed with exit status {}",
                    dosmain.exit_status
                );
                return Err(ExitCode::SubprocessFailedDosmain.into());
            }
        };

        info!("workchain completed successfully");
        Ok(DosWorkflowOutputs {
            openmx_parameters,
            dosmain_dos,
        })
    }

    fn dosmain_inputs(&self, remote_folder: RemoteFolder) -> DosmainInputs {
        let orbital_configurations = self
            .openmx
            .orbitals
            .iter()
            .map(|(kind, orb)| (kind.clone(), orb.orbital_configuration.clone()))
            .collect();

        DosmainInputs {
            dos_type: self.dosmain.dos_type,
            dos_method: self.dosmain.dos_method,
            gaussian_broadening: self.dosmain.gaussian_broadening,
            pdos_atom_indices: self.dosmain.pdos_atom_indices.clone(),
            openmx_output_folder: remote_folder,
            openmx_input_structure: Some(self.openmx.structure.clone()),
            openmx_orbital_configurations: Some(orbital_configurations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OmxError;
    use crate::models::{
        CalcOptions, Kind, KpointMesh, Lattice, OrbitalBasis, PseudoFile, Structure,
    };
    use crate::parsers::DosTable;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct MockLauncher {
        openmx_status: u32,
        dosmain_status: u32,
        calls: Vec<String>,
        dosmain_inputs: Option<DosmainInputs>,
    }

    impl MockLauncher {
        fn new(openmx_status: u32, dosmain_status: u32) -> Self {
            MockLauncher {
                openmx_status,
                dosmain_status,
                calls: Vec::new(),
                dosmain_inputs: None,
            }
        }
    }

    impl Launcher for MockLauncher {
        fn run_openmx(&mut self, label: &str, _calc: &OpenmxCalculation) -> Result<CompletedCalc> {
            self.calls.push(label.to_string());
            let mut params = Map::new();
            params.insert("u_tot".to_string(), json!(-200.0));
            Ok(CompletedCalc {
                exit_status: self.openmx_status,
                remote_folder: Some(RemoteFolder {
                    computer: "localhost".to_string(),
                    path: PathBuf::from("/scratch/run1"),
                }),
                output_parameters: Some(params),
                output_dos: None,
            })
        }

        fn run_dosmain(&mut self, label: &str, calc: &DosmainCalculation) -> Result<CompletedCalc> {
            self.calls.push(label.to_string());
            self.dosmain_inputs = Some(calc.inputs.clone());
            let mut dos = DosmainParsed::default();
            dos.tables.insert(
                "aiida.DOS.Tetrahedron".to_string(),
                DosTable {
                    rows: vec![vec![0.0, 1.0, 0.5]],
                },
            );
            Ok(CompletedCalc {
                exit_status: self.dosmain_status,
                output_dos: Some(dos),
                ..Default::default()
            })
        }
    }

    fn workflow(dos_fileout: Option<Value>) -> DosWorkflow {
        let mut structure = Structure::new(Lattice::from_parameters(
            5.0, 5.0, 5.0, 90.0, 90.0, 90.0,
        ));
        structure.append_atom(Kind::new("Si", "Si"), [0.0, 0.0, 0.0]);

        let mut parameters = BTreeMap::new();
        parameters.insert("scf.energycutoff".to_string(), json!(150.0));
        if let Some(v) = dos_fileout {
            parameters.insert("DOS_FILEOUT".to_string(), v);
        }

        let request = CalculationRequest {
            structure,
            kpoints: KpointMesh { mesh: [2, 2, 2] },
            parameters,
            settings: BTreeMap::new(),
            pseudos: [(
                "Si".to_string(),
                PseudoFile {
                    filename: "Si_PBE19.vps".to_string(),
                    element: "Si".to_string(),
                    xc_type: "GGA-PBE".to_string(),
                    path: None,
                },
            )]
            .into_iter()
            .collect(),
            orbitals: [(
                "Si".to_string(),
                OrbitalBasis {
                    filename: "Si7.0.pao".to_string(),
                    element: "Si".to_string(),
                    orbital_configuration: vec![2, 2, 1],
                    z_valence: 4.0,
                    path: None,
                },
            )]
            .into_iter()
            .collect(),
            options: CalcOptions::default(),
        };

        DosWorkflow::new(
            request,
            DosmainOptions {
                dos_type: DosType::Dos,
                dos_method: DosMethod::Tetrahedron,
                gaussian_broadening: None,
                pdos_atom_indices: None,
            },
        )
    }

    fn exit_code(err: OmxError) -> Option<ExitCode> {
        match err {
            OmxError::Exit(code) => Some(code),
            _ => None,
        }
    }

    #[test]
    fn test_successful_run() {
        let wf = workflow(Some(json!(true)));
        let mut launcher = MockLauncher::new(0, 0);
        let out = wf.run(&mut launcher).unwrap();

        assert_eq!(launcher.calls, vec!["openmx", "dosmain"]);
        assert_eq!(out.openmx_parameters["u_tot"], json!(-200.0));
        assert!(out.dosmain_dos.tables.contains_key("aiida.DOS.Tetrahedron"));

        let inputs = launcher.dosmain_inputs.unwrap();
        assert_eq!(inputs.openmx_output_folder.path, PathBuf::from("/scratch/run1"));
        assert_eq!(
            inputs.openmx_orbital_configurations.unwrap()["Si"],
            vec![2, 2, 1]
        );
    }

    #[test]
    fn test_dos_fileout_required() {
        for value in [None, Some(json!(false)), Some(json!("off"))] {
            let wf = workflow(value);
            assert_eq!(
                exit_code(wf.validate().unwrap_err()),
                Some(ExitCode::DosFileoutNotSpecified)
            );

            let mut launcher = MockLauncher::new(0, 0);
            let err = wf.run(&mut launcher).unwrap_err();
            assert_eq!(exit_code(err), Some(ExitCode::DosFileoutNotSpecified));
            assert!(launcher.calls.is_empty());
        }
        assert!(workflow(Some(json!("on"))).validate().is_ok());
    }

    #[test]
    fn test_duplicate_dos_fileout_spellings_rejected() {
        let mut wf = workflow(Some(json!(false)));
        wf.openmx
            .parameters
            .insert("Dos.fileout".to_string(), json!(true));

        assert!(matches!(wf.validate(), Err(OmxError::InputValidation(_))));
        let mut launcher = MockLauncher::new(0, 0);
        assert!(matches!(
            wf.run(&mut launcher),
            Err(OmxError::InputValidation(_))
        ));
        assert!(launcher.calls.is_empty());
    }

    #[test]
    fn test_openmx_failure_stops_workflow() {
        let wf = workflow(Some(json!(true)));
        let mut launcher = MockLauncher::new(312, 0);
        let err = wf.run(&mut launcher).unwrap_err();

        assert_eq!(exit_code(err), Some(ExitCode::SubprocessFailedOpenmx));
        assert_eq!(launcher.calls, vec!["openmx"]);
    }

    #[test]
    fn test_dosmain_failure() {
        let wf = workflow(Some(json!(true)));
        let mut launcher = MockLauncher::new(0, 303);
        let err = wf.run(&mut launcher).unwrap_err();
        assert_eq!(exit_code(err), Some(ExitCode::SubprocessFailedDosmain));
    }
}
