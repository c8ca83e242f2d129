//! # write 命令实现
//!
//! 读取 JSON 计算请求，校验并渲染 OpenMX 输入文件，准备作业目录。
//!
//! ## 功能
//! - 写出 `aiida.in` 与 `VPS/`, `PAO/` 子目录
//! - 将赝势与基组文件拷贝到作业目录
//! - 写出 `calcinfo.json`（命令行、标准输出名、取回列表）
//!
//! ## 依赖关系
//! - 使用 `cli/write.rs` 定义的参数
//! - 使用 `calculations/openmx.rs`, `input/writer.rs`
//! - 使用 `utils/output.rs`

use super::{create_job_folder, CALCINFO_FILE};
use crate::calculations::OpenmxCalculation;
use crate::cli::write::WriteArgs;
use crate::error::{OmxError, Result};
use crate::input::render_input;
use crate::models::CalculationRequest;
use crate::utils::output;

/// 执行 write 命令
pub fn execute(args: WriteArgs) -> Result<()> {
    if !args.request.exists() {
        return Err(OmxError::FileNotFound {
            path: args.request.display().to_string(),
        });
    }

    let request = CalculationRequest::from_json_file(&args.request)?;

    if args.dry_run {
        print!("{}", render_input(&request)?.text());
        return Ok(());
    }

    output::print_header("Preparing OpenMX Job");
    output::print_info(&format!(
        "Structure {} with {} site(s), k-mesh {:?}",
        request.structure.formula(),
        request.structure.sites.len(),
        request.kpoints.mesh
    ));

    create_job_folder(&args.output, args.overwrite)?;

    let input_filename = request.options.input_filename.clone();
    let calc = OpenmxCalculation::new(request);
    let calcinfo = calc.prepare_for_submission(&args.output)?;
    output::print_written("input", &args.output.join(&input_filename).display().to_string());

    let copied = calcinfo.stage_local_copies(&args.output)?;
    if copied < calc.request.structure.kind_names().len() * 2 {
        output::print_warning(
            "Some pseudopotential or orbital files have no local path; copy them into VPS/ and PAO/ manually",
        );
    }
    output::print_info(&format!("Copied {} VPS/PAO file(s)", copied));

    let calcinfo_path = args.output.join(CALCINFO_FILE);
    calcinfo.write_json(&calcinfo_path)?;
    output::print_written("calcinfo", &calcinfo_path.display().to_string());

    let cmdline = calcinfo
        .codes_info
        .first()
        .map(|code| code.cmdline_params.join(" "))
        .unwrap_or_default();
    output::print_done(&format!(
        "Job folder '{}' ready (run: openmx {})",
        args.output.display(),
        cmdline
    ));

    Ok(())
}
