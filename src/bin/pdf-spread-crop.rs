//! PDF Spread Crop CLI tool
//!
//! Splits a printer's spread PDF into single pages in reading order.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pdf_spread_crop::layout::MarginOffset;
use pdf_spread_crop::pdf::{crop_spread, plan_spread, SpreadOptions};
use pdf_spread_crop::Error;

/// Duplicate and crop pages in a PDF that has the pages laid out in "printer's spread"
#[derive(Parser)]
#[command(name = "pdf-spread-crop")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Write booklet.out.pdf next to booklet.pdf
    pdf-spread-crop booklet.pdf

    # Trim 6pt of blank margin from every side of each half
    pdf-spread-crop --reduce-margin-offset 6 booklet.pdf

    # Show which sheet and half each output page comes from
    pdf-spread-crop --dry-run booklet.pdf")]
struct Cli {
    /// Path to input PDF
    path: PathBuf,

    /// Offset by which to shrink the crop box to reduce blank margin space
    #[arg(long, default_value = "0", value_parser = parse_margin_offset, allow_negative_numbers = true)]
    reduce_margin_offset: MarginOffset,

    /// Print the page mapping without writing the output file
    #[arg(long)]
    dry_run: bool,

    /// Increase log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Parse and validate the margin offset before any file is touched
fn parse_margin_offset(value: &str) -> Result<MarginOffset, String> {
    let number: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    MarginOffset::new(number).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::new(format!("pdf_spread_crop={}", level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = SpreadOptions {
        margin_offset: cli.reduce_margin_offset,
        ..SpreadOptions::new(cli.path)
    };

    let result = if cli.dry_run {
        cmd_plan(&options)
    } else {
        cmd_crop(&options)
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(exit_code_for(&e));
    }
}

/// Exit status for a failed run; library errors keep their category code
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1)
}

/// Crop the spread and write the output document
fn cmd_crop(options: &SpreadOptions) -> anyhow::Result<()> {
    debug!(input = %options.input_path.display(), "cropping spread");

    let report = crop_spread(options)
        .with_context(|| format!("Could not crop {}", options.input_path.display()))?;

    println!("{}", report.output_path.display());
    eprintln!(
        "Cropped {} sheets into {} pages",
        report.source_pages, report.output_pages
    );

    Ok(())
}

/// Print the output page table
fn cmd_plan(options: &SpreadOptions) -> anyhow::Result<()> {
    let (output_path, plan) = plan_spread(options)
        .with_context(|| format!("Could not plan {}", options.input_path.display()))?;

    println!("Output: {}", output_path.display());
    println!("{:>6}  {:>6}  {:<6}  crop", "page", "sheet", "half");
    for (position, page) in plan.pages.iter().enumerate() {
        let crop = page.crop(&plan.crops);
        println!(
            "{:>6}  {:>6}  {:<6}  [{:.2} {:.2} {:.2} {:.2}]",
            position + 1,
            page.source_index + 1,
            page.half.as_str(),
            crop.x0,
            crop.y0,
            crop.x1,
            crop.y1
        );
    }

    Ok(())
}
