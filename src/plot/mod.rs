//! Chart rendering for analysis output.
//!
//! Each successfully analyzed pair gets one PNG chart showing training
//! actuals, evaluation actuals, and the counterfactual forecast. The
//! regression layer adds a per-region impact bar chart and a
//! residuals-vs-fitted scatter. Rendering failures surface as
//! `ImpactError::PlotWrite` and are never fatal to a run.

use crate::core::YearSeries;
use crate::error::{ImpactError, Result};
use plotters::prelude::*;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1000, 520);

/// Deterministic chart file name for an (item, region) pair.
///
/// Path separators in item names are replaced so the name stays a single
/// file.
pub fn chart_file_name(item: &str, area: &str) -> String {
    let raw = format!("{item}_{area}.png");
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c => c,
        })
        .collect()
}

/// Render the forecast-vs-actual chart for one pair.
///
/// `predicted` carries (year, value) points aligned to the evaluation
/// window.
pub fn forecast_chart(
    path: &Path,
    title: &str,
    training: &YearSeries,
    evaluation: &YearSeries,
    predicted: &[(i32, f64)],
) -> Result<()> {
    render_forecast(path, title, training, evaluation, predicted)
        .map_err(|e| ImpactError::PlotWrite(e.to_string()))
}

fn render_forecast(
    path: &Path,
    title: &str,
    training: &YearSeries,
    evaluation: &YearSeries,
    predicted: &[(i32, f64)],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let years: Vec<i32> = training
        .years()
        .iter()
        .chain(evaluation.years())
        .copied()
        .chain(predicted.iter().map(|(y, _)| *y))
        .collect();
    let values: Vec<f64> = training
        .values()
        .iter()
        .chain(evaluation.values())
        .copied()
        .chain(predicted.iter().map(|(_, v)| *v))
        .collect();

    let (x_range, y_range) = plot_ranges(&years, &values)?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Price (USD)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(training.iter(), &BLUE))?
        .label("Pre-pandemic actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLUE));
    chart.draw_series(
        training
            .iter()
            .map(|(x, y)| Circle::new((x, y), 3, BLUE.filled())),
    )?;

    chart
        .draw_series(LineSeries::new(evaluation.iter(), &BLACK))?
        .label("Post-pandemic actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLACK));
    chart.draw_series(
        evaluation
            .iter()
            .map(|(x, y)| Circle::new((x, y), 3, BLACK.filled())),
    )?;

    chart
        .draw_series(DashedLineSeries::new(
            predicted.iter().copied(),
            6,
            4,
            ShapeStyle::from(&RED),
        ))?
        .label("Counterfactual forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], RED));
    chart.draw_series(
        predicted
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, RED.filled())),
    )?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Render the estimated post-pandemic price shift per region as bars.
pub fn impact_chart(path: &Path, title: &str, impacts: &[(String, f64)]) -> Result<()> {
    render_impact(path, title, impacts).map_err(|e| ImpactError::PlotWrite(e.to_string()))
}

fn render_impact(
    path: &Path,
    title: &str,
    impacts: &[(String, f64)],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if impacts.is_empty() {
        return Err("no impacts to chart".into());
    }

    let lo = impacts.iter().map(|(_, v)| *v).fold(0.0_f64, f64::min);
    let hi = impacts.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let pad = ((hi - lo) * 0.1).max(0.05);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<&str> = impacts.iter().map(|(name, _)| name.as_str()).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(0.0..impacts.len() as f64, (lo - pad)..(hi + pad))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(impacts.len())
        .x_label_formatter(&|x| {
            let idx = *x as usize;
            labels.get(idx).copied().unwrap_or("").to_string()
        })
        .y_desc("Estimated price shift (USD)")
        .draw()?;

    chart.draw_series(impacts.iter().enumerate().map(|(i, (_, value))| {
        let (y0, y1) = if *value >= 0.0 {
            (0.0, *value)
        } else {
            (*value, 0.0)
        };
        Rectangle::new(
            [(i as f64 + 0.15, y0), (i as f64 + 0.85, y1)],
            BLUE.mix(0.6).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Render a residuals-vs-fitted scatter for a regression fit.
pub fn residual_chart(path: &Path, title: &str, fitted: &[f64], residuals: &[f64]) -> Result<()> {
    render_residuals(path, title, fitted, residuals)
        .map_err(|e| ImpactError::PlotWrite(e.to_string()))
}

fn render_residuals(
    path: &Path,
    title: &str,
    fitted: &[f64],
    residuals: &[f64],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if fitted.is_empty() || fitted.len() != residuals.len() {
        return Err("fitted and residual lengths must match and be non-empty".into());
    }

    let x_lo = fitted.iter().copied().fold(f64::INFINITY, f64::min);
    let x_hi = fitted.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let r_max = residuals
        .iter()
        .map(|r| r.abs())
        .fold(0.0_f64, f64::max)
        .max(1e-6);
    let x_pad = ((x_hi - x_lo) * 0.05).max(0.05);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(
            (x_lo - x_pad)..(x_hi + x_pad),
            (-1.1 * r_max)..(1.1 * r_max),
        )?;

    chart
        .configure_mesh()
        .x_desc("Fitted value")
        .y_desc("Residual")
        .draw()?;

    chart.draw_series(
        fitted
            .iter()
            .zip(residuals.iter())
            .map(|(&x, &r)| Circle::new((x, r), 3, BLUE.mix(0.7).filled())),
    )?;

    // Zero line for reference.
    chart.draw_series(LineSeries::new(
        vec![(x_lo - x_pad, 0.0), (x_hi + x_pad, 0.0)],
        &RED,
    ))?;

    root.present()?;
    Ok(())
}

/// Padded axis ranges covering every plotted point.
fn plot_ranges(
    years: &[i32],
    values: &[f64],
) -> std::result::Result<(std::ops::Range<i32>, std::ops::Range<f64>), Box<dyn std::error::Error>>
{
    if years.is_empty() || values.is_empty() {
        return Err("nothing to plot".into());
    }

    let x_lo = *years.iter().min().unwrap_or(&0);
    let x_hi = *years.iter().max().unwrap_or(&0);

    let y_lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let y_hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y_pad = ((y_hi - y_lo) * 0.08).max(0.05);

    Ok(((x_lo - 1)..(x_hi + 1), (y_lo - y_pad)..(y_hi + y_pad)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearSeries;
    use tempfile::tempdir;

    fn sample_series() -> (YearSeries, YearSeries, Vec<(i32, f64)>) {
        let training = YearSeries::new(
            (2010..=2019).collect(),
            (0..10).map(|i| 1.0 + 0.1 * i as f64).collect(),
        )
        .unwrap();
        let evaluation =
            YearSeries::new(vec![2020, 2021], vec![2.4, 2.7]).unwrap();
        let predicted = vec![(2020, 2.0), (2021, 2.1)];
        (training, evaluation, predicted)
    }

    #[test]
    fn chart_file_name_sanitizes_separators() {
        assert_eq!(
            chart_file_name("Juice, frozen/canned", "West"),
            "Juice, frozen-canned_West.png"
        );
        assert_eq!(chart_file_name("Bananas", "South"), "Bananas_South.png");
    }

    #[test]
    fn forecast_chart_writes_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let (training, evaluation, predicted) = sample_series();

        forecast_chart(&path, "Bananas - South", &training, &evaluation, &predicted).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn forecast_chart_to_invalid_path_is_plot_write_error() {
        let (training, evaluation, predicted) = sample_series();
        let path = Path::new("/nonexistent-dir/deeper/chart.png");

        let result = forecast_chart(path, "t", &training, &evaluation, &predicted);
        assert!(matches!(result, Err(ImpactError::PlotWrite(_))));
    }

    #[test]
    fn impact_chart_writes_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("impact.png");
        let impacts = vec![
            ("Northeast".to_string(), 0.8),
            ("Midwest".to_string(), -0.1),
            ("South".to_string(), 0.4),
        ];

        impact_chart(&path, "Pandemic impact", &impacts).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn residual_chart_writes_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("residuals.png");
        let fitted = vec![1.0, 2.0, 3.0, 4.0];
        let residuals = vec![0.1, -0.2, 0.05, 0.0];

        residual_chart(&path, "Residuals vs fitted", &fitted, &residuals).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn residual_chart_rejects_mismatched_lengths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("residuals.png");
        let result = residual_chart(&path, "t", &[1.0, 2.0], &[0.1]);
        assert!(matches!(result, Err(ImpactError::PlotWrite(_))));
    }
}
