//! # collect 命令实现
//!
//! 在根目录下收集所有 OpenMX 标准输出，并行解析并按总能排序。
//!
//! ## 功能
//! - glob 模式匹配标准输出文件（默认 `aiida.out`）
//! - rayon 并行解析，进度条反馈
//! - 被中断的计算（无总能）记为跳过
//! - 终端表格显示前 N 名，完整排名写入 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 使用 `batch/`, `parsers/openmx_out.rs`
//! - 使用 `utils/output.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::collect::{CollectArgs, RankBy};
use crate::error::{ExitCode, OmxError, Result};
use crate::parsers::parse_stdout;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 单次计算的排序数据
#[derive(Debug, Clone)]
struct RunSummary {
    run: String,
    n_atoms: usize,
    u_tot: f64,
    per_atom: Option<f64>,
    e_fermi: Option<f64>,
    elapsed: Option<f64>,
}

impl RunSummary {
    fn key(&self, rank_by: RankBy) -> Option<f64> {
        match rank_by {
            RankBy::Total => Some(self.u_tot),
            RankBy::PerAtom => self.per_atom,
        }
    }
}

/// 排名表行
#[derive(Debug, Clone, Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Run")]
    run: String,
    #[tabled(rename = "Atoms")]
    n_atoms: usize,
    #[tabled(rename = "Utot (eV)")]
    u_tot: String,
    #[tabled(rename = "ΔE (eV)")]
    delta: String,
    #[tabled(rename = "E_F (eV)")]
    e_fermi: String,
}

/// 执行 collect 命令
pub fn execute(args: CollectArgs) -> Result<()> {
    output::print_header("Collecting OpenMX Results");

    if !args.root.exists() {
        return Err(OmxError::DirectoryNotFound {
            path: args.root.display().to_string(),
        });
    }

    let files = FileCollector::new(args.root.clone())
        .with_pattern(&args.pattern)?
        .recursive(!args.no_recursive)
        .collect();
    if files.is_empty() {
        return Err(OmxError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Parsing {} output file(s) with {} job(s)...",
        files.len(),
        runner.jobs()
    ));

    let root = args.root.clone();
    let result = runner.run(&files, |file| summarize(file, &root))?;

    for (path, reason) in &result.skipped {
        output::print_skip(&format!("{}: {}", path, reason));
    }
    for (path, err) in &result.failures {
        output::print_warning(&format!("{}: {}", path, err));
    }

    let total = result.total();
    let mut runs = result.items;
    runs.retain(|r| r.key(args.rank_by).is_some());
    if runs.is_empty() {
        output::print_warning("No completed OpenMX runs with a total energy were found.");
        return Ok(());
    }
    sort_runs(&mut runs, args.rank_by);

    let reference = runs[0].key(args.rank_by).unwrap_or(0.0);
    let rows: Vec<RankRow> = runs
        .iter()
        .take(args.top_n)
        .enumerate()
        .map(|(i, r)| {
            let key = r.key(args.rank_by).unwrap_or(0.0);
            RankRow {
                rank: i + 1,
                run: r.run.clone(),
                n_atoms: r.n_atoms,
                u_tot: format!("{:.6}", r.u_tot),
                delta: format!("{:.6}", key - reference),
                e_fermi: r.e_fermi.map(|e| format!("{:.4}", e)).unwrap_or_default(),
            }
        })
        .collect();

    output::print_header(&format!(
        "Top {} Runs by {}",
        args.top_n.min(runs.len()),
        match args.rank_by {
            RankBy::Total => "Total Energy",
            RankBy::PerAtom => "Energy per Atom",
        }
    ));
    println!("{}", Table::new(&rows));

    save_ranking_csv(&runs, &args.output_csv)?;
    output::print_success(&format!(
        "{} of {} run(s) ranked, full ranking saved to '{}'",
        runs.len(),
        total,
        args.output_csv.display()
    ));

    Ok(())
}

/// 解析单个输出文件
fn summarize(file: &PathBuf, root: &Path) -> ProcessResult<RunSummary> {
    let run = run_label(file, root);

    let text = match fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => return ProcessResult::Failed(run, e.to_string()),
    };

    match parse_stdout(&text) {
        Ok(out) => match out.energies.u_tot {
            Some(u_tot) => ProcessResult::Success(RunSummary {
                run,
                n_atoms: out.final_positions.len(),
                u_tot,
                per_atom: out.energy_per_atom(),
                e_fermi: out.bands.as_ref().map(|b| b.e_fermi),
                elapsed: out.timing.as_ref().and_then(|t| t.elapsed_time),
            }),
            None => ProcessResult::Skipped(run, ExitCode::OutputStdoutIncomplete.to_string()),
        },
        Err(code) if code.is_job_failure() => ProcessResult::Skipped(run, code.to_string()),
        Err(code) => ProcessResult::Failed(run, code.to_string()),
    }
}

/// 以输出文件所在目录相对根目录的路径作为运行名
fn run_label(file: &Path, root: &Path) -> String {
    let dir = file.parent().unwrap_or(file);
    match dir.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => file.display().to_string(),
    }
}

fn sort_runs(runs: &mut [RunSummary], rank_by: RankBy) {
    runs.sort_by(|a, b| {
        a.key(rank_by)
            .partial_cmp(&b.key(rank_by))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// 保存完整排名到 CSV
fn save_ranking_csv(runs: &[RunSummary], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([
        "rank",
        "run",
        "n_atoms",
        "u_tot_eV",
        "u_tot_per_atom_eV",
        "e_fermi_eV",
        "elapsed_time_s",
    ])?;

    let opt = |v: Option<f64>| v.map(|x| format!("{:.10}", x)).unwrap_or_default();
    for (i, r) in runs.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            r.run.clone(),
            r.n_atoms.to_string(),
            format!("{:.10}", r.u_tot),
            opt(r.per_atom),
            opt(r.e_fermi),
            opt(r.elapsed),
        ])?;
    }

    wtr.flush().map_err(|e| OmxError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(run: &str, u_tot: f64, n_atoms: usize) -> RunSummary {
        RunSummary {
            run: run.to_string(),
            n_atoms,
            u_tot,
            per_atom: if n_atoms > 0 {
                Some(u_tot / n_atoms as f64)
            } else {
                None
            },
            e_fermi: None,
            elapsed: None,
        }
    }

    #[test]
    fn test_sort_runs() {
        let mut runs = vec![
            summary("a", -10.0, 1),
            summary("b", -30.0, 4),
            summary("c", -20.0, 1),
        ];
        sort_runs(&mut runs, RankBy::Total);
        assert_eq!(runs[0].run, "b");

        sort_runs(&mut runs, RankBy::PerAtom);
        assert_eq!(runs[0].run, "c");
        assert_eq!(runs[2].run, "b");
    }

    #[test]
    fn test_run_label() {
        let root = Path::new("/data/runs");
        assert_eq!(run_label(Path::new("/data/runs/si/aiida.out"), root), "si");
        assert_eq!(
            run_label(Path::new("/data/runs/aiida.out"), root),
            "/data/runs/aiida.out"
        );
    }

    #[test]
    fn test_execute_ranks_completed_runs() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
        let csv_path =
            std::env::temp_dir().join(format!("omxutil_ranking_{}.csv", std::process::id()));
        let args = CollectArgs {
            root,
            pattern: "aiida.out".to_string(),
            no_recursive: false,
            jobs: 2,
            rank_by: RankBy::Total,
            top_n: 5,
            output_csv: csv_path.clone(),
        };
        execute(args).unwrap();

        let text = fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("rank,run,n_atoms,u_tot_eV"));
        assert!(text.lines().any(|l| l.contains(",si_scf,2,")));
        assert!(!text.contains("truncated"));

        fs::remove_file(&csv_path).unwrap();
    }

    #[test]
    fn test_summarize_truncated_is_skipped() {
        let dir = std::env::temp_dir().join(format!("omxutil_summarize_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("aiida.out");
        fs::write(&file, "OpenMX Ver. 3.9\n").unwrap();

        match summarize(&file, &dir) {
            ProcessResult::Skipped(_, reason) => assert!(reason.starts_with("[312]")),
            other => panic!("unexpected {:?}", other),
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
