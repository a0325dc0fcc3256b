//! SegmentForge: RFM customer segmentation CLI
//!
//! Loads a CSV table, scores every customer, writes the per-customer report
//! and renders summary charts.

use anyhow::{Context, Result};
use clap::Parser;
use segmentforge::{compute_rfm_with, load_table, print_report, save_report, viz, Args};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let start_time = Instant::now();
    let options = args.pipeline_options()?;

    log::info!("loading {}", args.input.display());
    let table = load_table(&args.input)?;
    log::debug!("columns: {:?}", table.columns());
    println!("✓ Data loaded: {} rows", table.height());

    log::info!(
        "reference date {}, schema {:?}",
        options.reference_date.format("%Y-%m-%d %H:%M:%S"),
        options.schema
    );
    let report = compute_rfm_with(&table, &options).context("RFM computation failed")?;
    println!(
        "✓ Scored {} customers ({} unscored)",
        report.scored_count(),
        report.unscored.len()
    );

    save_report(&args.output, &report.records)?;
    println!("✓ Report saved to: {}", args.output.display());

    print_report(&report, args.top);

    if args.no_charts {
        log::debug!("chart rendering disabled");
    } else if report.records.is_empty() {
        log::warn!("no scored customers, skipping charts");
    } else {
        let paths = viz::generate_charts(&report, &args.charts)?;
        println!("\n✓ Charts saved:");
        println!("  {}", paths.segments.display());
        println!("  {}", paths.recency_monetary.display());
        println!("  {}", paths.frequency.display());
    }

    println!(
        "\nTotal processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug over info.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
