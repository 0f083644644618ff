//! CLI definition using clap

use clap::{Parser, Subcommand};
use fillcheck_types::{OutputFormat, SimilarityStrategy};
use fillcheck_vision::{KitchenZone, ZoneRect};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fillcheck")]
#[command(version)]
#[command(about = "Bottle fill level and plate consumption estimation from photos")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging, diagnostics in tables)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Include the annotated image as base64 JPEG in JSON output
    #[arg(long, global = true)]
    pub embed_image: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Measure remaining liquid in a bottle photo
    Volume {
        /// Path to image file
        image: PathBuf,

        /// Bottle capacity in mL. Uses config value if not specified.
        #[arg(long, short = 'c')]
        capacity: Option<f64>,

        /// Write the annotated photo (JPEG) to this path
        #[arg(long, short = 'a')]
        annotated: Option<PathBuf>,
    },

    /// Measure every bottle photo in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        /// Output file for results
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Number of parallel measurements. 0 = auto (CPU count). Uses 4 if not specified.
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        /// Bottle capacity in mL. Uses config value if not specified.
        #[arg(long, short = 'c')]
        capacity: Option<f64>,
    },

    /// Export batch results to Excel
    Export {
        /// Path to JSON results file
        results: PathBuf,

        /// Output Excel file path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Compare a plate photo against a full-plate photo
    Compare {
        /// Photo of the plate after the meal
        current: PathBuf,

        /// Photo of the full plate
        reference: PathBuf,

        /// Weight of a full serving
        #[arg(long, short = 'w')]
        weight: f64,

        /// Similarity strategy. Uses config value if not specified.
        #[arg(long, short = 's')]
        strategy: Option<SimilarityStrategy>,
    },

    /// Manage registered dishes
    Dish {
        #[command(subcommand)]
        action: DishCommands,
    },

    /// Score kitchen stations on a photo and log one waste record per zone
    Kitchen {
        /// Path to the kitchen photo
        image: PathBuf,

        /// Zone as NAME=X,Y,WIDTH,HEIGHT in pixels (repeatable)
        #[arg(long = "zone", short = 'z', required = true, value_parser = parse_zone)]
        zones: Vec<KitchenZone>,
    },

    /// Show waste statistics
    Stats {
        /// Clear the waste log
        #[arg(long)]
        reset: bool,
    },

    /// Project waste costs and savings
    Costs {
        /// Purchase cost per unit of wasted food
        #[arg(long)]
        cost_per_unit: Option<f64>,

        /// Disposal cost per unit
        #[arg(long)]
        disposal_cost: Option<f64>,

        /// Labor cost per hour
        #[arg(long)]
        labor_cost: Option<f64>,

        /// Labor minutes per unit of waste
        #[arg(long)]
        labor_minutes: Option<f64>,

        /// Units wasted per working day
        #[arg(long)]
        daily_waste: Option<f64>,

        /// Working days per week
        #[arg(long)]
        days_per_week: Option<f64>,

        /// Reduction target in percent
        #[arg(long)]
        reduction_target: Option<f64>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default bottle capacity (mL)
        #[arg(long)]
        set_capacity: Option<f64>,

        /// Set consumption strategy
        #[arg(long)]
        set_strategy: Option<SimilarityStrategy>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set store directory (dish registry, waste log)
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set calibration TOML file
        #[arg(long)]
        set_calibration: Option<PathBuf>,

        /// Set maximum accepted image side (px)
        #[arg(long)]
        set_max_image_side: Option<u32>,

        /// Set JPEG quality (1-100)
        #[arg(long)]
        set_jpeg_quality: Option<u8>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum DishCommands {
    /// Register a full-plate reference photo
    Register {
        /// Dish name
        name: String,

        /// Weight of a full serving
        #[arg(long, short = 'w')]
        weight: f64,

        /// Path to the full-plate photo
        #[arg(long, short = 'i')]
        image: PathBuf,
    },

    /// List registered dishes
    List,

    /// Analyze a plate photo against a registered dish and log the waste
    Analyze {
        /// Dish ID
        dish_id: String,

        /// Photo of the plate after the meal
        image: PathBuf,

        /// Zone label (serving line, table block)
        #[arg(long, short = 'z')]
        zone: Option<String>,
    },
}

/// Parse `NAME=X,Y,WIDTH,HEIGHT`
fn parse_zone(s: &str) -> Result<KitchenZone, String> {
    let (name, coords) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=X,Y,WIDTH,HEIGHT, got '{}'", s))?;
    if name.is_empty() {
        return Err("zone name is empty".to_string());
    }
    let values = coords
        .split(',')
        .map(|v| v.trim().parse::<i64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match values[..] {
        [x, y, width, height] => Ok(KitchenZone::new(name, ZoneRect::new(x, y, width, height))),
        _ => Err(format!("expected 4 coordinates, got {}", values.len())),
    }
}
