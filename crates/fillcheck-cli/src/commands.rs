//! Command handlers

use crate::cli::{Cli, Commands, DishCommands};
use crate::error::Result;
use crate::output::{
    output_consumption, output_costs, output_dish_analysis, output_dishes, output_kitchen,
    output_stats, output_volume,
};
use fillcheck_app::app::AnalysisService;
use fillcheck_app::batch::{run_volume_batch, BatchOptions, BatchVolumeResults};
use fillcheck_app::calibration::load_calibration;
use fillcheck_app::config::Config;
use fillcheck_app::export::export_to_excel;
use fillcheck_app::scanner::scan_directory;
use fillcheck_domain::service::{project_costs, CostInputs};
use fillcheck_types::{Error, OutputFormat, SimilarityStrategy};
use fillcheck_vision::{encode_jpeg, KitchenZone};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};

/// Worker count when `--jobs` is not given
const DEFAULT_JOBS: usize = 4;

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let output_format = cli.format.unwrap_or(config.output_format);
    let embed = cli.embed_image.then_some(config.jpeg_quality);

    match &cli.command {
        Commands::Volume {
            image,
            capacity,
            annotated,
        } => {
            let capacity = capacity.unwrap_or(config.default_capacity_ml);
            cmd_volume(&cli, &config, image, capacity, annotated.as_deref(), output_format, embed)
        }

        Commands::Batch {
            folder,
            output,
            jobs,
            capacity,
        } => {
            // 0 = auto CPU count
            let job_count = match jobs {
                Some(0) => num_cpus::get(),
                Some(n) => *n,
                None => DEFAULT_JOBS,
            };
            let capacity = capacity.unwrap_or(config.default_capacity_ml);
            cmd_batch(&cli, &config, folder, output.clone(), job_count, capacity, output_format)
        }

        Commands::Export { results, output } => cmd_export(results, output.clone()),

        Commands::Compare {
            current,
            reference,
            weight,
            strategy,
        } => {
            let strategy = strategy.unwrap_or(config.similarity_strategy);
            cmd_compare(&cli, &config, current, reference, *weight, strategy, output_format, embed)
        }

        Commands::Dish { action } => cmd_dish(&cli, &config, action, output_format, embed),

        Commands::Kitchen { image, zones } => cmd_kitchen(&config, image, zones, output_format),

        Commands::Stats { reset } => cmd_stats(&config, *reset, output_format),

        Commands::Costs {
            cost_per_unit,
            disposal_cost,
            labor_cost,
            labor_minutes,
            daily_waste,
            days_per_week,
            reduction_target,
        } => {
            let defaults = CostInputs::default();
            let inputs = CostInputs {
                cost_per_unit: cost_per_unit.unwrap_or(defaults.cost_per_unit),
                disposal_cost: disposal_cost.unwrap_or(defaults.disposal_cost),
                labor_cost_per_hour: labor_cost.unwrap_or(defaults.labor_cost_per_hour),
                labor_minutes_per_unit: labor_minutes.unwrap_or(defaults.labor_minutes_per_unit),
                daily_waste: daily_waste.unwrap_or(defaults.daily_waste),
                days_per_week: days_per_week.unwrap_or(defaults.days_per_week),
                reduction_target_percent: reduction_target
                    .unwrap_or(defaults.reduction_target_percent),
            };
            cmd_costs(&inputs, output_format)
        }

        Commands::Config {
            show,
            set_capacity,
            set_strategy,
            set_output,
            set_store_dir,
            set_calibration,
            set_max_image_side,
            set_jpeg_quality,
            reset,
        } => cmd_config(ConfigUpdate {
            show: *show,
            capacity: *set_capacity,
            strategy: *set_strategy,
            output: *set_output,
            store_dir: set_store_dir.clone(),
            calibration: set_calibration.clone(),
            max_image_side: *set_max_image_side,
            jpeg_quality: *set_jpeg_quality,
            reset: *reset,
        }),
    }
}

fn cmd_volume(
    cli: &Cli,
    config: &Config,
    image: &Path,
    capacity: f64,
    annotated: Option<&Path>,
    output_format: OutputFormat,
    embed: Option<u8>,
) -> Result<()> {
    let service = AnalysisService::from_config(config)?;
    let report = service.measure_bottle(image, capacity)?;

    if let Some(path) = annotated {
        let jpeg = encode_jpeg(&report.annotated, config.jpeg_quality)?;
        std::fs::write(path, jpeg)?;
        info!("Annotated image written to {}", path.display());
    }

    output_volume(output_format, &report, embed, cli.verbose)
}

fn cmd_batch(
    cli: &Cli,
    config: &Config,
    folder: &Path,
    output: Option<PathBuf>,
    jobs: usize,
    capacity_ml: f64,
    output_format: OutputFormat,
) -> Result<()> {
    let images = scan_directory(folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!("No images found in {}", folder.display())).into());
    }

    let total_images = images.len();
    info!(
        "Found {} images to measure with {} parallel jobs",
        total_images, jobs
    );

    let options = BatchOptions {
        capacity_ml,
        jobs,
        max_image_side: config.max_image_side,
        calibration: config.calibration()?.volume,
    };

    let multi_progress = MultiProgress::new();
    let main_pb = multi_progress.add(ProgressBar::new(total_images as u64));
    main_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let verbose = cli.verbose;
    let results = run_volume_batch(&images, &options, |image| {
        if verbose {
            let filename = image.file_name().and_then(|n| n.to_str()).unwrap_or("");
            main_pb.set_message(filename.to_string());
        }
        main_pb.inc(1);
    });

    main_pb.finish_with_message("Complete");

    if let Some(output_path) = output {
        results.save(&output_path)?;
        println!("Results saved to: {}", output_path.display());
        return Ok(());
    }

    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("\nBatch Measurement Complete");
    println!("==========================");
    println!("Total:      {}", results.total);
    println!("Successful: {}", results.successful);
    println!("Failed:     {}", results.failed);
    if let Some(avg) = results.average_volume_ml() {
        println!("Average:    {:.1} mL", avg);
    }
    println!(
        "Duration:   {:.1}s",
        (results.completed_at - results.started_at).num_milliseconds() as f64 / 1000.0
    );

    for failure in &results.failures {
        println!(
            "  [{}] {}: {}",
            failure.stage.as_deref().unwrap_or("-"),
            failure.image_path,
            failure.error
        );
    }

    Ok(())
}

fn cmd_export(results_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let results = BatchVolumeResults::load(results_path)?;

    let output_path = output.unwrap_or_else(|| {
        let stem = results_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("results");
        results_path.with_file_name(format!("{}.xlsx", stem))
    });

    export_to_excel(&results, &output_path)?;

    println!("Exported to: {}", output_path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    cli: &Cli,
    config: &Config,
    current: &Path,
    reference: &Path,
    weight: f64,
    strategy: SimilarityStrategy,
    output_format: OutputFormat,
    embed: Option<u8>,
) -> Result<()> {
    let service = AnalysisService::from_config(config)?.with_strategy(strategy);
    let report = service.compare(current, reference, weight)?;
    output_consumption(output_format, &report, embed, cli.verbose)
}

fn cmd_dish(
    cli: &Cli,
    config: &Config,
    action: &DishCommands,
    output_format: OutputFormat,
    embed: Option<u8>,
) -> Result<()> {
    let service = AnalysisService::from_config(config)?;

    match action {
        DishCommands::Register {
            name,
            weight,
            image,
        } => {
            let dish = service.register_dish(name, *weight, image)?;
            if output_format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&dish)?);
            } else {
                println!(
                    "Registered dish {} ({}, full weight {:.1})",
                    dish.dish_id, dish.name, dish.full_weight
                );
            }
            Ok(())
        }

        DishCommands::List => output_dishes(output_format, &service.list_dishes()?),

        DishCommands::Analyze {
            dish_id,
            image,
            zone,
        } => {
            let analysis = service.analyze_dish(dish_id, image, zone.clone())?;
            output_dish_analysis(output_format, &analysis, embed, cli.verbose)
        }
    }
}

fn cmd_kitchen(
    config: &Config,
    image: &Path,
    zones: &[KitchenZone],
    output_format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::from_config(config)?;
    let analysis = service.analyze_kitchen_zones(image, zones)?;
    output_kitchen(output_format, &analysis)
}

fn cmd_stats(config: &Config, reset: bool, output_format: OutputFormat) -> Result<()> {
    let service = AnalysisService::from_config(config)?;

    if reset {
        let count = service.reset_statistics()?;
        println!("Cleared {} waste records", count);
        return Ok(());
    }

    output_stats(output_format, &service.statistics()?)
}

fn cmd_costs(inputs: &CostInputs, output_format: OutputFormat) -> Result<()> {
    let projection = project_costs(inputs)?;
    output_costs(output_format, &projection)
}

/// Requested configuration changes
struct ConfigUpdate {
    show: bool,
    capacity: Option<f64>,
    strategy: Option<SimilarityStrategy>,
    output: Option<OutputFormat>,
    store_dir: Option<PathBuf>,
    calibration: Option<PathBuf>,
    max_image_side: Option<u32>,
    jpeg_quality: Option<u8>,
    reset: bool,
}

fn cmd_config(update: ConfigUpdate) -> Result<()> {
    if update.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(capacity) = update.capacity {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "capacity must be positive, got {}",
                capacity
            ))
            .into());
        }
        config.default_capacity_ml = capacity;
        modified = true;
    }

    if let Some(strategy) = update.strategy {
        config.similarity_strategy = strategy;
        modified = true;
    }

    if let Some(output_format) = update.output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(dir) = update.store_dir {
        config.store_dir = Some(dir);
        modified = true;
    }

    if let Some(path) = update.calibration {
        load_calibration(Some(path.as_path()))?;
        config.calibration_file = Some(path);
        modified = true;
    }

    if let Some(side) = update.max_image_side {
        config.max_image_side = side;
        modified = true;
    }

    if let Some(quality) = update.jpeg_quality {
        config.jpeg_quality = quality.clamp(1, 100);
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if update.show || !modified {
        println!("{}", config);
    }

    Ok(())
}
