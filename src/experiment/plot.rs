//! SVG charts of real versus predicted wait times.

use crate::error::{ModelError, Result};
use crate::experiment::fit_line::FitLine;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const SIZE: (u32, u32) = (800, 500);

fn plot_err<E: std::fmt::Display>(err: E) -> ModelError {
    ModelError::Plot(err.to_string())
}

/// Padded `[min, max]` over all values; `0..1` when there are none.
fn axis_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

/// Scatter of real and predicted `Wq` against one explanatory variable, with
/// a least-squares line through each.
pub fn comparison_plot(
    path: &Path,
    variable: &str,
    xs: &[f64],
    real: &[f64],
    predicted: &[f64],
) -> Result<()> {
    let x_range = axis_range(xs);
    let y_range = axis_range(real.iter().chain(predicted));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Wq vs {}", variable), ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(variable)
        .y_desc("Wq")
        .draw()
        .map_err(plot_err)?;

    for (values, color, name) in [(real, RED, "Real Wq"), (predicted, BLUE, "Predicted Wq")] {
        chart
            .draw_series(
                xs.iter()
                    .zip(values)
                    .map(move |(&x, &y)| Circle::new((x, y), 3, color.mix(0.6).filled())),
            )
            .map_err(plot_err)?
            .label(name)
            .legend(move |(x, y)| Circle::new((x, y), 3, color.filled()));

        if let Some(line) = FitLine::least_squares(xs, values) {
            let ends = [x_range.start, x_range.end];
            chart
                .draw_series(LineSeries::new(
                    ends.iter().map(|&x| (x, line.at(x))),
                    color.stroke_width(2),
                ))
                .map_err(plot_err)?
                .label(format!("{} fit", name))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Actual against predicted `Wq` with the identity line.
pub fn actual_vs_predicted_plot(path: &Path, actual: &[f64], predicted: &[f64]) -> Result<()> {
    let range = axis_range(actual.iter().chain(predicted));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Actual vs Predicted Wq", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(range.clone(), range.clone())
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("Actual Wq")
        .y_desc("Predicted Wq")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            actual
                .iter()
                .zip(predicted)
                .map(|(&a, &p)| Circle::new((a, p), 3, BLUE.mix(0.5).filled())),
        )
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(
            [range.start, range.end].into_iter().map(|v| (v, v)),
            RED.stroke_width(2),
        ))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range(&[]), 0.0..1.0);
        assert_eq!(axis_range(&[2.0, 2.0]), 1.0..3.0);
        let r = axis_range(&[0.0, 10.0]);
        assert!((r.start + 0.5).abs() < 1e-12 && (r.end - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_plots_are_written() {
        let dir = tempdir().unwrap();
        let xs = [0.1, 0.4, 0.7, 0.9];
        let real = [0.2, 0.9, 2.3, 8.1];
        let pred = [0.3, 1.0, 2.0, 7.5];

        let cmp = dir.path().join("cmp.svg");
        comparison_plot(&cmp, "Lambda (λ)", &xs, &real, &pred).unwrap();
        assert!(std::fs::read_to_string(&cmp).unwrap().contains("<svg"));

        let avp = dir.path().join("avp.svg");
        actual_vs_predicted_plot(&avp, &real, &pred).unwrap();
        assert!(std::fs::metadata(&avp).unwrap().len() > 0);
    }
}
