use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

use retail_dashboard::data::cache::DATASET_CACHE;
use retail_dashboard::report;
use retail_dashboard::state::DashboardState;
use retail_dashboard::{Dimension, FilterSelection};

#[derive(Parser, Debug)]
#[command(version, about = "Retail point-of-sale dashboard")]
struct Args {
    /// Path to the POS dataset (.csv, .json or .parquet).
    #[arg(value_name = "DATASET", env = "RETAIL_DASHBOARD_DATA")]
    dataset: PathBuf,

    /// Keep only these states (repeatable).
    #[arg(long = "state", value_name = "STATE")]
    states: Vec<String>,

    /// Keep only these cities (repeatable).
    #[arg(long = "city", value_name = "CITY")]
    cities: Vec<String>,

    /// Keep only these ZIP codes (repeatable).
    #[arg(long = "zip", value_name = "ZIP")]
    zips: Vec<String>,

    /// Keep only these product categories (repeatable).
    #[arg(long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,

    /// Keep only these brands (repeatable).
    #[arg(long = "brand", value_name = "BRAND")]
    brands: Vec<String>,

    /// Keep only these product types (repeatable).
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// First sale date to include, YYYY-MM-DD. Defaults to the earliest date.
    #[arg(long, value_name = "DATE")]
    start: Option<NaiveDate>,

    /// Last sale date to include, YYYY-MM-DD. Defaults to the latest date.
    #[arg(long, value_name = "DATE")]
    end: Option<NaiveDate>,

    /// Print the snapshot as JSON instead of a text report.
    #[arg(long)]
    json: bool,

    /// Print the values offered for each filter and exit.
    #[arg(long)]
    list_choices: bool,
}

impl Args {
    fn dimension_filters(&self) -> [(Dimension, &[String]); 6] {
        [
            (Dimension::State, self.states.as_slice()),
            (Dimension::City, self.cities.as_slice()),
            (Dimension::Zip, self.zips.as_slice()),
            (Dimension::Category, self.categories.as_slice()),
            (Dimension::Brand, self.brands.as_slice()),
            (Dimension::ProductType, self.types.as_slice()),
        ]
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Dashboard run failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    // Nothing below runs unless the dataset loaded in full.
    let dataset = DATASET_CACHE
        .get_or_load(&args.dataset)
        .with_context(|| format!("could not load dataset {}", args.dataset.display()))?;

    if args.list_choices {
        for dim in Dimension::ALL {
            let values: Vec<&str> = dataset.candidates(dim).iter().map(String::as_str).collect();
            println!("{dim}: {}", values.join(", "));
        }
        if let Some((start, end)) = dataset.date_span() {
            println!("Dates: {start} to {end}");
        }
        return Ok(());
    }

    let mut state = DashboardState::new(dataset);

    let mut selection = FilterSelection::for_dataset(state.dataset());
    for (dim, values) in args.dimension_filters() {
        selection = selection.with(dim, values.iter().cloned());
    }
    if let Some(start) = args.start {
        selection.date_range.start = start;
    }
    if let Some(end) = args.end {
        selection.date_range.end = end;
    }
    state.set_selection(selection);

    if args.json {
        let json = serde_json::to_string_pretty(state.snapshot()).context("serializing snapshot")?;
        println!("{json}");
    } else {
        print!("{}", report::render(state.snapshot()));
    }
    Ok(())
}
