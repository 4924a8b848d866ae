//! Batch driver: load the cleaned BLS price dataset, run the
//! forecast-and-compare analysis for every configured (item, region) pair,
//! then fit the per-item pandemic-impact regressions.
//!
//! Input and output locations are fixed relative paths; run from the
//! repository root.

use grocery_impact::analysis::{self, AnalysisConfig, RunReport};
use grocery_impact::data::Dataset;
use grocery_impact::{plot, regression};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DATA_PATH: &str = "cleaned_data/cleaned_bls_data.csv";
const FORECAST_CHART_DIR: &str = "charts/forecasts";
const REGRESSION_CHART_DIR: &str = "charts/regression";

const REGIONS: [&str; 4] = ["Midwest", "Northeast", "South", "West"];

/// Every item series carried by the cleaned dataset.
const FOODS: [&str; 36] = [
    "All Ham (Excluding Canned Ham and Luncheon Slices), per lb. (453.6 gm)",
    "All Other Pork (Excluding Canned Ham and Luncheon Slices), per lb. (453.6 gm)",
    "All Pork Chops, per lb. (453.6 gm)",
    "All Uncooked Beef Roasts, per lb. (453.6 gm)",
    "All Uncooked Beef Steaks, per lb. (453.6 gm)",
    "All Uncooked Other Beef (Excluding Veal), per lb. (453.6 gm)",
    "All soft drinks, per 2 liters (67.6 oz)",
    "All uncooked ground beef, per lb. (453.6 gm)",
    "American processed cheese, per lb. (453.6 gm)",
    "Bacon, sliced, per lb. (453.6 gm)",
    "Bananas, per lb. (453.6 gm)",
    "Bread, white, pan, per lb. (453.6 gm)",
    "Cheddar cheese, natural, per lb. (453.6 gm)",
    "Chicken breast, boneless, per lb. (453.6 gm)",
    "Chicken legs, bone-in, per lb. (453.6 gm)",
    "Chicken, fresh, whole, per lb. (453.6 gm)",
    "Chops, boneless, per lb. (453.6 gm)",
    "Chuck roast, USDA Choice, boneless, per lb. (453.6 gm)",
    "Grapefruit, per lb. (453.6 gm)",
    "Ground beef, 100% beef, per lb. (453.6 gm)",
    "Ham, boneless, excluding canned, per lb. (453.6 gm)",
    "Ice cream, prepackaged, bulk, regular, per 1/2 gal. (1.9 lit)",
    "Lemons, per lb. (453.6 gm)",
    "Malt beverages, all types, all sizes, any origin, per 16 oz. (473.2 ml)",
    "Milk, fresh, low-fat, reduced fat, skim, per gal. (3.8 lit)",
    "Milk, fresh, whole, fortified, per gal. (3.8 lit)",
    "Oranges, Navel, per lb. (453.6 gm)",
    "Potato chips, per 16 oz.",
    "Potatoes, white, per lb. (453.6 gm)",
    "Round roast, USDA Choice, boneless, per lb. (453.6 gm)",
    "Spaghetti and macaroni, per lb. (453.6 gm)",
    "Steak, round, USDA Choice, boneless, per lb. (453.6 gm)",
    "Steak, sirloin, USDA Choice, boneless, per lb. (453.6 gm)",
    "Tomatoes, field grown, per lb. (453.6 gm)",
    "Wine, red and white table, all sizes, any origin, per 1 liter (33.8 oz)",
    "Yogurt, per 8 oz. (226.8 gm)",
];

/// Staple items the regression pass drills into.
const REGRESSION_ITEMS: [&str; 5] = [
    "All uncooked ground beef, per lb. (453.6 gm)",
    "Bananas, per lb. (453.6 gm)",
    "Milk, fresh, low-fat, reduced fat, skim, per gal. (3.8 lit)",
    "Potato chips, per 16 oz.",
    "Bread, white, pan, per lb. (453.6 gm)",
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!("analysis failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> grocery_impact::Result<()> {
    let dataset = Dataset::from_csv(DATA_PATH)?;
    info!("loaded {} observations from {DATA_PATH}", dataset.len());

    let config = AnalysisConfig::new()
        .with_items(FOODS.iter().map(|s| s.to_string()).collect())
        .with_regions(REGIONS.iter().map(|s| s.to_string()).collect())
        .with_chart_dir(FORECAST_CHART_DIR);

    let report = analysis::run(&dataset, &config);
    print_summary(&report);

    run_regressions(&dataset);
    Ok(())
}

/// Per-pair mean deviation from the counterfactual, plus run totals.
fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{:<52} {:>5} {:>12} {:>10}",
        "Item / Region", "Years", "Mean diff", "Mean pct"
    );
    println!("{}", "-".repeat(82));

    for (key, rows) in report.results.iter() {
        let mean_diff =
            rows.iter().map(|r| r.difference).sum::<f64>() / rows.len().max(1) as f64;

        let pcts: Vec<f64> = rows.iter().filter_map(|r| r.pct_change).collect();
        let mean_pct = if pcts.is_empty() {
            "n/a".to_string()
        } else {
            format!("{:.2}%", pcts.iter().sum::<f64>() / pcts.len() as f64)
        };

        println!(
            "{:<52} {:>5} {:>12.3} {:>10}",
            truncate(&key.to_string(), 52),
            rows.len(),
            mean_diff,
            mean_pct
        );
    }

    println!("{}", "-".repeat(82));
    println!(
        "{} pairs analyzed, {} skipped, {} used the fallback order, {} charts written ({} failed)",
        report.results.len(),
        report.skipped.len(),
        report.fallback_pairs,
        report.charts_written,
        report.chart_errors
    );
}

/// Fit and report the pandemic-impact regression for each staple item.
/// Per-item failures are logged and do not stop the remaining items.
fn run_regressions(dataset: &Dataset) {
    let chart_dir = Path::new(REGRESSION_CHART_DIR);
    if let Err(e) = std::fs::create_dir_all(chart_dir) {
        warn!(
            "could not create chart directory {}: {}",
            chart_dir.display(),
            e
        );
    }

    let regions: Vec<String> = REGIONS.iter().map(|s| s.to_string()).collect();

    for item in REGRESSION_ITEMS {
        let model = match regression::fit_impact_model(dataset, item, &regions, 2020) {
            Ok(model) => model,
            Err(e) => {
                warn!("{item}: regression skipped: {e}");
                continue;
            }
        };

        let impacts = model.regional_impacts();
        println!();
        println!("Pandemic impact for: {item}");
        println!("(reference region: {})", model.reference_region);
        for (region, impact) in &impacts {
            println!("  {region:<12} {impact:>8.3}");
        }

        let impact_path = chart_dir.join(plot::chart_file_name(item, "impact"));
        if let Err(e) = plot::impact_chart(
            &impact_path,
            &format!("Post-pandemic price shift by region - {item}"),
            &impacts,
        ) {
            warn!("{item}: impact chart failed: {e}");
        } else {
            info!("{item}: impact chart saved to {}", impact_path.display());
        }

        let residual_path = chart_dir.join(plot::chart_file_name(item, "residuals"));
        if let Err(e) = plot::residual_chart(
            &residual_path,
            &format!("Residuals vs fitted - {item}"),
            model.fitted(),
            model.residuals(),
        ) {
            warn!("{item}: residual chart failed: {e}");
        } else {
            info!(
                "{item}: residual chart saved to {}",
                residual_path.display()
            );
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max - 3).collect();
        format!("{kept}...")
    }
}
