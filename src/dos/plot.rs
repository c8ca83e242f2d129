//! # DOS 图表生成
//!
//! 使用 `plotters` 绘制态密度曲线。自旋极化时同时画出两个自旋通道
//! （DosMain 已将自旋向下写为负值），并在 E = 0（化学势）处画竖线。
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 调用
//! - 使用 `parsers/dos.rs` 的 DosTable 结构
//! - 使用 `plotters` 渲染图表

use crate::error::{OmxError, Result};
use crate::parsers::DosTable;

use plotters::prelude::*;
use std::path::Path;

/// 生成 DOS 图表
pub fn generate_dos_plot(
    table: &DosTable,
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_dos_chart(&root, table, title)?;
        root.present()
            .map_err(|e| OmxError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_dos_chart(&root, table, title)?;
        root.present()
            .map_err(|e| OmxError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 需要绘制的 (标签, 曲线) 列表
fn curves(table: &DosTable) -> Vec<(&'static str, Vec<(f64, f64)>)> {
    let energies = table.energies();
    let column = |i: usize| -> Vec<(f64, f64)> {
        energies
            .iter()
            .copied()
            .zip(table.column(i).unwrap_or_default())
            .collect()
    };

    if table.is_spin_polarized() {
        vec![("up", column(1)), ("down", column(2))]
    } else {
        vec![("DOS", column(1))]
    }
}

/// 绘制图表的核心逻辑
fn draw_dos_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    table: &DosTable,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    if table.n_columns() < 2 {
        return Err(OmxError::InvalidArgument(
            "DOS table needs at least an energy and a DOS column".to_string(),
        ));
    }

    root.fill(&WHITE)
        .map_err(|e| OmxError::Other(format!("{:?}", e)))?;

    let series = curves(table);
    let energies = table.energies();
    let x_min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = series
        .iter()
        .flat_map(|(_, pts)| pts.iter().map(|(_, y)| *y))
        .fold((0.0_f64, 0.0_f64), |(lo, hi), y| (lo.min(y), hi.max(y)));
    let pad = ((y_max - y_min) * 0.05).max(1e-3);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))
        .map_err(|e| OmxError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("E - μ (eV)")
        .y_desc("DOS (states/eV)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| OmxError::Other(format!("{:?}", e)))?;

    let colors = [RGBColor(0, 102, 204), RGBColor(204, 51, 0)];
    for (i, (label, points)) in series.into_iter().enumerate() {
        let color = colors[i % colors.len()];
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(|e| OmxError::Other(format!("{:?}", e)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    // 化学势
    if x_min < 0.0 && x_max > 0.0 {
        chart
            .draw_series(LineSeries::new(
                vec![(0.0, y_min - pad), (0.0, y_max + pad)],
                BLACK.mix(0.5),
            ))
            .map_err(|e| OmxError::Other(format!("{:?}", e)))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| OmxError::Other(format!("{:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_spin_polarized() {
        let table = DosTable {
            rows: vec![vec![-1.0, 0.5, -0.5, 0.1, 0.1], vec![1.0, 1.0, -1.0, 0.2, 0.2]],
        };
        let c = curves(&table);
        assert_eq!(c.len(), 2);
        assert_eq!(c[1].1, vec![(-1.0, -0.5), (1.0, -1.0)]);
    }

    #[test]
    fn test_curves_single_channel() {
        let table = DosTable {
            rows: vec![vec![-1.0, 0.5, 0.1]],
        };
        let c = curves(&table);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].0, "DOS");
    }
}
