//! # dosmain 命令实现
//!
//! 为已完成的 OpenMX 计算（`Dos.fileout on`）准备 DosMain 作业目录。
//!
//! ## 依赖关系
//! - 使用 `cli/dosmain.rs` 定义的参数
//! - 使用 `calculations/dosmain.rs`
//! - 使用 `utils/output.rs`

use super::{create_job_folder, CALCINFO_FILE};
use crate::calculations::dosmain::INPUT_FILE;
use crate::calculations::openmx::{DOS_VAL_FILENAME, DOS_VEC_FILENAME};
use crate::calculations::{DosmainCalculation, DosmainInputs, RemoteFolder};
use crate::cli::dosmain::DosmainArgs;
use crate::error::{OmxError, Result};
use crate::models::CalculationRequest;
use crate::utils::output;

use std::collections::BTreeMap;

/// 执行 dosmain 命令
pub fn execute(args: DosmainArgs) -> Result<()> {
    output::print_header("Preparing DosMain Job");

    if !args.openmx_dir.is_dir() {
        return Err(OmxError::DirectoryNotFound {
            path: args.openmx_dir.display().to_string(),
        });
    }
    for name in [DOS_VAL_FILENAME, DOS_VEC_FILENAME] {
        if !args.openmx_dir.join(name).exists() {
            output::print_warning(&format!(
                "'{}' not found in '{}'; was the run made with Dos.fileout on?",
                name,
                args.openmx_dir.display()
            ));
        }
    }

    let (structure, orbitals) = match &args.request {
        Some(path) => {
            let request = CalculationRequest::from_json_file(path)?;
            let orbitals: BTreeMap<String, Vec<u32>> = request
                .orbitals
                .iter()
                .map(|(kind, orb)| (kind.clone(), orb.orbital_configuration.clone()))
                .collect();
            (Some(request.structure), Some(orbitals))
        }
        None => (None, None),
    };

    let openmx_dir = args
        .openmx_dir
        .canonicalize()
        .map_err(|e| OmxError::FileReadError {
            path: args.openmx_dir.display().to_string(),
            source: e,
        })?;

    let inputs = DosmainInputs {
        dos_type: args.dos_type.into(),
        dos_method: args.method.into(),
        gaussian_broadening: args.broadening,
        pdos_atom_indices: if args.atoms.is_empty() {
            None
        } else {
            Some(args.atoms.clone())
        },
        openmx_output_folder: RemoteFolder {
            computer: args.computer.clone(),
            path: openmx_dir,
        },
        openmx_input_structure: structure,
        openmx_orbital_configurations: orbitals,
    };

    let calc = DosmainCalculation::new(inputs);
    // 校验先于创建目录，避免留下空目录
    calc.validate()?;

    create_job_folder(&args.output, true)?;
    let calcinfo = calc.prepare_for_submission(&args.output)?;

    let calcinfo_path = args.output.join(CALCINFO_FILE);
    calcinfo.write_json(&calcinfo_path)?;
    output::print_written("stdin", &args.output.join(INPUT_FILE).display().to_string());
    output::print_written("calcinfo", &calcinfo_path.display().to_string());

    output::print_info(&format!(
        "Expected output: {}",
        calc.output_filenames().join(", ")
    ));
    output::print_done(&format!("Job folder '{}' ready", args.output.display()));

    Ok(())
}
