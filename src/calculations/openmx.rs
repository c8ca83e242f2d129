//! # OpenMX 主程序作业
//!
//! 写入 `aiida.in`，创建 `VPS/` 与 `PAO/` 子目录，列出需要拷贝的赝势与基组文件，
//! 并把 `CMDLINE` / `ADDITIONAL_RETRIEVE_LIST` 设置合并到调用与取回列表中。
//!
//! ## 依赖关系
//! - 被 `workflows/dos.rs`, `commands/write.rs` 使用
//! - 使用 `input/`, `calculations/mod.rs`

use super::{create_subfolder, write_file, CalcInfo, CodeInfo, LocalCopy};
use crate::error::{OmxError, Result};
use crate::input::{render_input, Settings, SYSTEM_NAME};
use crate::models::CalculationRequest;

use log::{debug, info};
use std::path::Path;

/// 赝势子目录
pub const PSEUDO_SUBFOLDER: &str = "VPS";
/// 基组子目录
pub const ORBITAL_SUBFOLDER: &str = "PAO";

/// `Dos.fileout on` 时 OpenMX 写出的本征值文件
pub const DOS_VAL_FILENAME: &str = "aiida.Dos.val";
/// `Dos.fileout on` 时 OpenMX 写出的本征向量文件
pub const DOS_VEC_FILENAME: &str = "aiida.Dos.vec";

/// OpenMX 计算作业
#[derive(Debug, Clone)]
pub struct OpenmxCalculation {
    pub request: CalculationRequest,
}

impl OpenmxCalculation {
    pub fn new(request: CalculationRequest) -> Self {
        OpenmxCalculation { request }
    }

    /// 系统名，所有输出文件以此为前缀
    pub fn system_name() -> &'static str {
        SYSTEM_NAME
    }

    /// 在 `folder` 中准备作业
    pub fn prepare_for_submission(&self, folder: &Path) -> Result<CalcInfo> {
        if !folder.is_dir() {
            return Err(OmxError::DirectoryNotFound {
                path: folder.display().to_string(),
            });
        }

        let rendered = render_input(&self.request)?;
        let settings = Settings::from_map(&self.request.settings)?;
        let options = &self.request.options;

        create_subfolder(folder, PSEUDO_SUBFOLDER)?;
        create_subfolder(folder, ORBITAL_SUBFOLDER)?;
        write_file(folder, &options.input_filename, &rendered.text())?;

        let mut local_copy_list = Vec::new();
        for kind in self.request.structure.kind_names() {
            if let Some(pseudo) = self.request.pseudos.get(kind) {
                match &pseudo.path {
                    Some(src) => local_copy_list.push(LocalCopy {
                        source: src.clone(),
                        target: format!("{}/{}", PSEUDO_SUBFOLDER, pseudo.filename),
                    }),
                    None => debug!("No local path for pseudopotential {}", pseudo.filename),
                }
            }
            if let Some(orbital) = self.request.orbitals.get(kind) {
                match &orbital.path {
                    Some(src) => local_copy_list.push(LocalCopy {
                        source: src.clone(),
                        target: format!("{}/{}", ORBITAL_SUBFOLDER, orbital.filename),
                    }),
                    None => debug!("No local path for orbital basis {}", orbital.filename),
                }
            }
        }

        let mut cmdline_params = vec![options.input_filename.clone()];
        cmdline_params.extend(settings.cmdline.iter().cloned());

        let code = CodeInfo {
            cmdline_params,
            stdin_name: None,
            stdout_name: options.output_filename.clone(),
            with_mpi: options.withmpi,
        };

        let mut retrieve_list = vec![options.output_filename.clone()];
        retrieve_list.extend(settings.additional_retrieve_list.iter().cloned());

        info!(
            "Prepared OpenMX job for {} in {}",
            self.request.structure.formula(),
            folder.display()
        );

        Ok(CalcInfo {
            codes_info: vec![code],
            local_copy_list,
            remote_symlink_list: Vec::new(),
            retrieve_list,
        })
    }
}
