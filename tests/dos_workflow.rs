//! DOS 工作流的集成测试
//!
//! 启动器在临时目录中准备作业，并用 `tests/data` 中的参考输出代替真实运行。

use omxutil::calculations::{DosMethod, DosType, DosmainCalculation, OpenmxCalculation, RemoteFolder};
use omxutil::models::CalculationRequest;
use omxutil::parsers::{DirFolder, DosmainParser, OpenmxParser};
use omxutil::workflows::{CompletedCalc, DosWorkflow, DosmainOptions, Launcher};
use omxutil::{ExitCode, OmxError, Result};

use serde_json::json;
use std::fs;
use std::path::PathBuf;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn silicon_request() -> CalculationRequest {
    CalculationRequest::from_json_file(&data_dir().join("si_request.json")).unwrap()
}

/// 以参考输出目录代替远程运行结果
struct FixtureLauncher {
    scratch: PathBuf,
    openmx_output: PathBuf,
    dos_output: PathBuf,
    labels: Vec<String>,
    dosmain_stdin: Option<String>,
}

impl FixtureLauncher {
    fn new(name: &str) -> Self {
        let scratch =
            std::env::temp_dir().join(format!("omxutil_wf_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&scratch);
        fs::create_dir_all(scratch.join("openmx")).unwrap();
        fs::create_dir_all(scratch.join("dosmain")).unwrap();
        FixtureLauncher {
            scratch,
            openmx_output: data_dir().join("si_scf"),
            dos_output: data_dir().join("dos"),
            labels: Vec::new(),
            dosmain_stdin: None,
        }
    }
}

impl Drop for FixtureLauncher {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.scratch);
    }
}

impl Launcher for FixtureLauncher {
    fn run_openmx(&mut self, label: &str, calc: &OpenmxCalculation) -> Result<CompletedCalc> {
        self.labels.push(label.to_string());
        calc.prepare_for_submission(&self.scratch.join("openmx"))?;

        let folder = DirFolder::new(&self.openmx_output)?;
        let parser = OpenmxParser::new("aiida.out", Some(calc.request.structure.clone()));
        match parser.parse(&folder, "nomd") {
            Ok(parsed) => Ok(CompletedCalc {
                exit_status: 0,
                remote_folder: Some(RemoteFolder {
                    computer: "localhost".to_string(),
                    path: self.openmx_output.clone(),
                }),
                output_parameters: Some(parsed.parameters),
                output_dos: None,
            }),
            Err(code) => Ok(CompletedCalc {
                exit_status: code.status(),
                ..Default::default()
            }),
        }
    }

    fn run_dosmain(&mut self, label: &str, calc: &DosmainCalculation) -> Result<CompletedCalc> {
        self.labels.push(label.to_string());
        let folder = self.scratch.join("dosmain");
        calc.prepare_for_submission(&folder)?;
        self.dosmain_stdin = Some(fs::read_to_string(folder.join("aiida.in")).unwrap());

        let parser = DosmainParser::new(
            calc.inputs.dos_type,
            calc.inputs.dos_method,
            calc.inputs.pdos_atom_indices.clone().unwrap_or_default(),
        );
        match parser.parse(&DirFolder::new(&self.dos_output)?) {
            Ok(dos) => Ok(CompletedCalc {
                exit_status: 0,
                output_dos: Some(dos),
                ..Default::default()
            }),
            Err(code) => Ok(CompletedCalc {
                exit_status: code.status(),
                ..Default::default()
            }),
        }
    }
}

fn options(dos_type: DosType, dos_method: DosMethod) -> DosmainOptions {
    DosmainOptions {
        dos_type,
        dos_method,
        gaussian_broadening: None,
        pdos_atom_indices: None,
    }
}

#[test]
fn test_dos_workflow_success() {
    let mut launcher = FixtureLauncher::new("dos");
    let workflow = DosWorkflow::new(
        silicon_request(),
        options(DosType::Dos, DosMethod::Tetrahedron),
    );

    let outputs = workflow.run(&mut launcher).unwrap();
    assert_eq!(launcher.labels, vec!["openmx", "dosmain"]);
    assert_eq!(launcher.dosmain_stdin.as_deref(), Some("1\n1\n"));
    assert!(outputs.openmx_parameters.contains_key("u_tot"));
    assert_eq!(
        outputs.dosmain_dos.tables["aiida.DOS.Tetrahedron"].n_rows(),
        6
    );
}

#[test]
fn test_pdos_workflow_passes_structure_and_atoms() {
    let mut launcher = FixtureLauncher::new("pdos");
    let mut opts = options(DosType::Pdos, DosMethod::Tetrahedron);
    opts.pdos_atom_indices = Some(vec![1, 2]);
    let workflow = DosWorkflow::new(silicon_request(), opts);

    let outputs = workflow.run(&mut launcher).unwrap();
    assert_eq!(launcher.dosmain_stdin.as_deref(), Some("1\n2\n1 2\n"));
    assert_eq!(outputs.dosmain_dos.tables.len(), 2);
}

#[test]
fn test_dos_fileout_required() {
    let mut launcher = FixtureLauncher::new("fileout");
    let mut request = silicon_request();
    request
        .parameters
        .insert("Dos.fileout".to_string(), json!("off"));
    let workflow = DosWorkflow::new(request, options(DosType::Dos, DosMethod::Tetrahedron));

    match workflow.run(&mut launcher) {
        Err(OmxError::Exit(code)) => assert_eq!(code, ExitCode::DosFileoutNotSpecified),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    assert!(launcher.labels.is_empty());
}

#[test]
fn test_failed_openmx_run() {
    let mut launcher = FixtureLauncher::new("openmx_fail");
    launcher.openmx_output = data_dir().join("truncated");
    let workflow = DosWorkflow::new(
        silicon_request(),
        options(DosType::Dos, DosMethod::Tetrahedron),
    );

    match workflow.run(&mut launcher) {
        Err(OmxError::Exit(code)) => assert_eq!(code.status(), 401),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    assert_eq!(launcher.labels, vec!["openmx"]);
}

#[test]
fn test_failed_dosmain_run() {
    let mut launcher = FixtureLauncher::new("dosmain_fail");
    let mut opts = options(DosType::Dos, DosMethod::Gaussian);
    opts.gaussian_broadening = Some(0.1);
    let workflow = DosWorkflow::new(silicon_request(), opts);

    // 参考目录中没有 Gaussian 输出
    match workflow.run(&mut launcher) {
        Err(OmxError::Exit(code)) => assert_eq!(code, ExitCode::SubprocessFailedDosmain),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    assert_eq!(
        launcher.dosmain_stdin.as_deref(),
        Some("2\n0.100000000000\n1\n")
    );
}
