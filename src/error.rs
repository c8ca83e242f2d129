//! # 统一错误处理模块
//!
//! 定义 omxutil 的错误类型与退出码，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 输入校验错误：提交前发现的请求问题 (`OmxError::InputValidation`)
//! - 外部作业失败：输出缺失、不完整等，映射为宿主框架的 `ExitCode`
//! - 部分解析警告：不产生错误，记录在解析结果的 `warnings` 中
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// omxutil 统一错误类型
#[derive(Error, Debug)]
pub enum OmxError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 输入校验错误（提交前）
    // ─────────────────────────────────────────────────────────────
    #[error("Input validation failed: {0}")]
    InputValidation(String),

    // ─────────────────────────────────────────────────────────────
    // 作业失败（由宿主框架报告的退出码）
    // ─────────────────────────────────────────────────────────────
    #[error(transparent)]
    Exit(#[from] ExitCode),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, OmxError>;

/// 宿主框架可识别的退出码
///
/// 数值与 aiida-openmx 插件保持一致，3xx 为解析阶段，4xx 为工作流子进程失败。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    #[error("[201] `DOS_FILEOUT` must be True in `openmx.parameters`.")]
    DosFileoutNotSpecified,

    #[error("[301] The retrieved temporary folder could not be accessed.")]
    NoRetrievedFolder,

    #[error("[302] The retrieved folder did not contain the required stdout output file.")]
    OutputStdoutMissing,

    #[error("[303] The retrieved folder did not contain the required dos output file.")]
    OutputDosMissing,

    #[error("[310] The stdout output file could not be read.")]
    OutputStdoutRead,

    #[error("[311] The stdout output file could not be parsed.")]
    OutputStdoutParse,

    #[error("[312] The stdout output file was incomplete probably because the calculation was interrupted.")]
    OutputStdoutIncomplete,

    #[error("[313] The dos output file could not be read.")]
    OutputDosRead,

    #[error("[314] The dos output file could not be parsed.")]
    OutputDosParse,

    #[error("[315] The dos output file was incomplete probably because the calculation was interrupted.")]
    OutputDosIncomplete,

    #[error("[350] The parser raised an unexpected exception.")]
    UnexpectedParserException,

    #[error("[401] The openmx OpenmxCalculation subprocess failed.")]
    SubprocessFailedOpenmx,

    #[error("[402] The DosMain DosmainCalculation subprocess failed.")]
    SubprocessFailedDosmain,
}

impl ExitCode {
    /// 数值退出状态
    pub fn status(&self) -> u32 {
        match self {
            ExitCode::DosFileoutNotSpecified => 201,
            ExitCode::NoRetrievedFolder => 301,
            ExitCode::OutputStdoutMissing => 302,
            ExitCode::OutputDosMissing => 303,
            ExitCode::OutputStdoutRead => 310,
            ExitCode::OutputStdoutParse => 311,
            ExitCode::OutputStdoutIncomplete => 312,
            ExitCode::OutputDosRead => 313,
            ExitCode::OutputDosParse => 314,
            ExitCode::OutputDosIncomplete => 315,
            ExitCode::UnexpectedParserException => 350,
            ExitCode::SubprocessFailedOpenmx => 401,
            ExitCode::SubprocessFailedDosmain => 402,
        }
    }

    /// 退出码标签
    pub fn label(&self) -> &'static str {
        match self {
            ExitCode::DosFileoutNotSpecified => "ERROR_DOS_FILEOUT_NOT_SPECIFIED",
            ExitCode::NoRetrievedFolder => "ERROR_NO_RETRIEVED_TEMPORARY_FOLDER",
            ExitCode::OutputStdoutMissing => "ERROR_OUTPUT_STDOUT_MISSING",
            ExitCode::OutputDosMissing => "ERROR_OUTPUT_DOS_MISSING",
            ExitCode::OutputStdoutRead => "ERROR_OUTPUT_STDOUT_READ",
            ExitCode::OutputStdoutParse => "ERROR_OUTPUT_STDOUT_PARSE",
            ExitCode::OutputStdoutIncomplete => "ERROR_OUTPUT_STDOUT_INCOMPLETE",
            ExitCode::OutputDosRead => "ERROR_OUTPUT_DOS_READ",
            ExitCode::OutputDosParse => "ERROR_OUTPUT_DOS_PARSE",
            ExitCode::OutputDosIncomplete => "ERROR_OUTPUT_DOS_INCOMPLETE",
            ExitCode::UnexpectedParserException => "ERROR_UNEXPECTED_PARSER_EXCEPTION",
            ExitCode::SubprocessFailedOpenmx => "ERROR_SUBPROCESS_FAILED_OPENMX",
            ExitCode::SubprocessFailedDosmain => "ERROR_SUBPROCESS_FAILED_DOSMAIN",
        }
    }

    /// 是否表示外部作业本身失败（而非文件访问问题）
    ///
    /// 输出不完整意味着 OpenMX 被中断，宿主框架据此决定是否重启。
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            ExitCode::OutputStdoutIncomplete
                | ExitCode::OutputDosIncomplete
                | ExitCode::SubprocessFailedOpenmx
                | ExitCode::SubprocessFailedDosmain
        )
    }
}
