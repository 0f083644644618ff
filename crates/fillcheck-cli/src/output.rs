//! Output formatting module

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fillcheck_app::app::{DishAnalysis, KitchenAnalysis, WasteReport};
use fillcheck_domain::model::ReferenceRecord;
use fillcheck_domain::service::CostProjection;
use fillcheck_types::{FeatureVector, OutputFormat};
use fillcheck_vision::{encode_jpeg, ConsumptionReport, LiquidVolumeReport};
use image::RgbImage;
use serde_json::{json, Value};

use crate::error::Result;

/// Key under which the annotated JPEG is embedded in JSON output
pub const EMBEDDED_IMAGE_KEY: &str = "annotatedImage";

/// Insert the annotated image as base64 JPEG when `embed` carries a quality
fn embed_image(mut value: Value, image: &RgbImage, embed: Option<u8>) -> Result<Value> {
    if let (Some(quality), Value::Object(map)) = (embed, &mut value) {
        let jpeg = encode_jpeg(image, quality)?;
        map.insert(EMBEDDED_IMAGE_KEY.to_string(), Value::String(STANDARD.encode(jpeg)));
    }
    Ok(value)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_diagnostics(diagnostics: &FeatureVector) {
    println!("\n--- Diagnostics ---");
    for (name, value) in diagnostics.iter() {
        println!("{:<22} {:.4}", name, value);
    }
}

pub fn output_volume(
    format: OutputFormat,
    report: &LiquidVolumeReport,
    embed: Option<u8>,
    verbose: bool,
) -> Result<()> {
    let est = &report.estimate;
    if format == OutputFormat::Json {
        let value = embed_image(serde_json::to_value(est)?, &report.annotated, embed)?;
        return print_json(&value);
    }

    println!("\nFill Level");
    println!("==========");
    println!("Remaining:       {:.1}%", est.percent);
    println!("Volume:          {:.1} / {:.0} mL", est.volume_ml, est.capacity_ml);
    println!(
        "Liquid height:   {} px of {} px usable",
        est.liquid_height_px, est.usable_height_px
    );
    let b = est.bottle;
    println!("Bottle box:      {},{} {}x{}", b.x, b.y, b.width, b.height);
    if est.used_fallback {
        println!("Mask:            grayscale fallback");
    }
    if verbose {
        print_diagnostics(&est.diagnostics);
    }
    Ok(())
}

fn print_consumption_table(report: &ConsumptionReport, verbose: bool) {
    let est = &report.estimate;
    println!("Strategy:        {}", est.strategy);
    println!("Consumed:        {:.1}% ({:.1})", est.consumed_percent, est.consumed_weight);
    println!("Wasted:          {:.1}% ({:.1})", est.wasted_percent, est.wasted_weight);
    println!("Full serving:    {:.1}", est.full_weight);
    if est.used_fallback {
        println!("Food area:       fallback engaged");
    }
    if verbose {
        print_diagnostics(&est.diagnostics);
    }
}

pub fn output_consumption(
    format: OutputFormat,
    report: &ConsumptionReport,
    embed: Option<u8>,
    verbose: bool,
) -> Result<()> {
    if format == OutputFormat::Json {
        let value = embed_image(serde_json::to_value(&report.estimate)?, &report.annotated, embed)?;
        return print_json(&value);
    }

    println!("\nPlate Consumption");
    println!("=================");
    print_consumption_table(report, verbose);
    Ok(())
}

pub fn output_dish_analysis(
    format: OutputFormat,
    analysis: &DishAnalysis,
    embed: Option<u8>,
    verbose: bool,
) -> Result<()> {
    if format == OutputFormat::Json {
        let value = json!({
            "dish": analysis.dish,
            "estimate": analysis.report.estimate,
            "record": analysis.record,
        });
        let value = embed_image(value, &analysis.report.annotated, embed)?;
        return print_json(&value);
    }

    println!("\nDish {}: {}", analysis.dish.dish_id, analysis.dish.name);
    println!("==========");
    print_consumption_table(&analysis.report, verbose);
    if let Some(ref zone) = analysis.record.zone {
        println!("Zone:            {}", zone);
    }
    println!("Logged as:       {}", analysis.record.id);
    Ok(())
}

pub fn output_kitchen(format: OutputFormat, analysis: &KitchenAnalysis) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(analysis)?);
    }

    println!("\nKitchen Zones");
    println!("=============");
    println!("{:<20} {:>8} {:>8}", "Zone", "Factor", "Score");
    println!("{}", "-".repeat(38));
    for zone in &analysis.report.zones {
        let factor = zone.diagnostics.get("factor").unwrap_or(1.0);
        match zone.clipped {
            Some(_) => println!("{:<20} {:>8.2} {:>8.3}", truncate(&zone.zone, 20), factor, zone.score),
            None => println!("{:<20} {:>8.2} {:>8}", truncate(&zone.zone, 20), factor, "outside"),
        }
    }
    println!("{}", "-".repeat(38));
    println!("{:<20} {:>8} {:>8.3}", "Total", "", analysis.report.total);
    Ok(())
}

pub fn output_dishes(format: OutputFormat, dishes: &[ReferenceRecord]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(dishes)?);
    }

    if dishes.is_empty() {
        println!("No dishes registered");
        return Ok(());
    }

    println!("{:<6} {:<24} {:>10}  {}", "ID", "Name", "Weight", "Registered");
    println!("{}", "-".repeat(64));
    for d in dishes {
        println!(
            "{:<6} {:<24} {:>10.1}  {}",
            d.dish_id,
            truncate(&d.name, 24),
            d.full_weight,
            d.registered_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn output_stats(format: OutputFormat, report: &WasteReport) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(report)?);
    }

    let Some(ref summary) = report.summary else {
        println!("No waste records yet");
        return Ok(());
    };

    println!("\nWaste Statistics");
    println!("================");
    println!("Records:         {}", summary.count);
    println!("Total wasted:    {:.1}", summary.total);
    println!("Average:         {:.1}", summary.average);
    println!("Max / Min:       {:.1} / {:.1}", summary.max, summary.min);

    if !report.zone_averages.is_empty() {
        println!("\n--- By Zone ---");
        for (zone, avg) in &report.zone_averages {
            println!("{:<16} {:.1}", zone, avg);
        }
    }

    if !report.time_series.is_empty() {
        println!("\n--- By Minute ---");
        for (bucket, total) in &report.time_series {
            println!("{}  {:.1}", bucket, total);
        }
    }
    Ok(())
}

pub fn output_costs(format: OutputFormat, projection: &CostProjection) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(projection)?);
    }

    println!("\nCost Projection");
    println!("===============");
    println!("Cost per unit:   {:.2}", projection.cost_per_unit_total);
    println!();
    println!("{:<10} {:>12} {:>12} {:>12}", "", "Cost", "Savings", "After");
    let rows = [
        ("Daily", projection.costs.daily, projection.savings.daily, projection.reduced_costs.daily),
        ("Weekly", projection.costs.weekly, projection.savings.weekly, projection.reduced_costs.weekly),
        ("Monthly", projection.costs.monthly, projection.savings.monthly, projection.reduced_costs.monthly),
        ("Annual", projection.costs.annual, projection.savings.annual, projection.reduced_costs.annual),
    ];
    for (label, cost, saving, after) in rows {
        println!("{:<10} {:>12.2} {:>12.2} {:>12.2}", label, cost, saving, after);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
