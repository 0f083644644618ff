//! Excel export of batch volume runs

use crate::batch::BatchVolumeResults;
use fillcheck_types::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

fn excel_err(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Export batch results to an Excel file with Summary and Details sheets
pub fn export_to_excel(results: &BatchVolumeResults, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, results)?;

    let details_sheet = workbook.add_worksheet();
    write_details_sheet(details_sheet, results)?;

    if !results.failures.is_empty() {
        let failures_sheet = workbook.add_worksheet();
        write_failures_sheet(failures_sheet, results)?;
    }

    workbook.save(output_path).map_err(excel_err)?;

    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, results: &BatchVolumeResults) -> Result<()> {
    sheet.set_name("Summary").map_err(excel_err)?;

    let header_format = Format::new().set_bold();

    sheet
        .write_string_with_format(0, 0, "Bottle Fill Level Report", &header_format)
        .map_err(excel_err)?;

    let rows: [(&str, String); 2] = [
        ("Analysis Date:", results.started_at.to_rfc3339()),
        ("Completed:", results.completed_at.to_rfc3339()),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = 2 + i as u32;
        sheet.write_string(row, 0, *label).map_err(excel_err)?;
        sheet.write_string(row, 1, value).map_err(excel_err)?;
    }

    let counts = [
        ("Total Images:", results.total as f64),
        ("Successful:", results.successful as f64),
        ("Failed:", results.failed as f64),
        ("Capacity (mL):", results.capacity_ml),
    ];
    for (i, (label, value)) in counts.iter().enumerate() {
        let row = 4 + i as u32;
        sheet.write_string(row, 0, *label).map_err(excel_err)?;
        sheet.write_number(row, 1, *value).map_err(excel_err)?;
    }

    if let Some(avg) = results.average_volume_ml() {
        sheet
            .write_string_with_format(9, 0, "Average Volume (mL)", &header_format)
            .map_err(excel_err)?;
        sheet.write_number(9, 1, avg).map_err(excel_err)?;
    }

    let fallback_count = results
        .entries
        .iter()
        .filter(|e| e.estimate.used_fallback)
        .count();
    sheet.write_string(10, 0, "Grayscale Fallback:").map_err(excel_err)?;
    sheet
        .write_number(10, 1, fallback_count as f64)
        .map_err(excel_err)?;

    sheet.set_column_width(0, 22).map_err(excel_err)?;
    sheet.set_column_width(1, 30).map_err(excel_err)?;

    Ok(())
}

fn write_details_sheet(sheet: &mut Worksheet, results: &BatchVolumeResults) -> Result<()> {
    sheet.set_name("Details").map_err(excel_err)?;

    let header_format = Format::new().set_bold();

    let headers = [
        "File",
        "Fill %",
        "Volume (mL)",
        "Capacity (mL)",
        "Liquid Height (px)",
        "Usable Height (px)",
        "Bottle Box",
        "Fallback",
    ];

    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }

    for (row_idx, entry) in results.entries.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        let est = &entry.estimate;

        let filename = Path::new(&entry.image_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&entry.image_path);
        sheet.write_string(row, 0, filename).map_err(excel_err)?;
        sheet.write_number(row, 1, est.percent).map_err(excel_err)?;
        sheet.write_number(row, 2, est.volume_ml).map_err(excel_err)?;
        sheet.write_number(row, 3, est.capacity_ml).map_err(excel_err)?;
        sheet
            .write_number(row, 4, est.liquid_height_px as f64)
            .map_err(excel_err)?;
        sheet
            .write_number(row, 5, est.usable_height_px as f64)
            .map_err(excel_err)?;

        let b = est.bottle;
        sheet
            .write_string(row, 6, format!("{},{} {}x{}", b.x, b.y, b.width, b.height))
            .map_err(excel_err)?;
        sheet
            .write_string(row, 7, if est.used_fallback { "gray" } else { "color" })
            .map_err(excel_err)?;
    }

    sheet.set_column_width(0, 30).map_err(excel_err)?;
    sheet.set_column_width(6, 18).map_err(excel_err)?;

    Ok(())
}

fn write_failures_sheet(sheet: &mut Worksheet, results: &BatchVolumeResults) -> Result<()> {
    sheet.set_name("Failures").map_err(excel_err)?;

    let header_format = Format::new().set_bold();
    for (col, header) in ["File", "Stage", "Error"].iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }

    for (row_idx, failure) in results.failures.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet
            .write_string(row, 0, &failure.image_path)
            .map_err(excel_err)?;
        sheet
            .write_string(row, 1, failure.stage.as_deref().unwrap_or("-"))
            .map_err(excel_err)?;
        sheet.write_string(row, 2, &failure.error).map_err(excel_err)?;
    }

    sheet.set_column_width(0, 40).map_err(excel_err)?;
    sheet.set_column_width(2, 60).map_err(excel_err)?;

    Ok(())
}
