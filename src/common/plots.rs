//! Plotting infrastructure for the node-age forest plot
//!
//! This module renders one horizontal error bar per taxon (whisker spanning
//! the 95% HDI, tick at the posterior mean) using the [`plotters`] crate.
//! Charts are saved as PNG files; the image height scales with the row
//! count.

use crate::common::data_structures::NodeAgeSummary;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Fixed X-axis upper bound of the estimated-age domain, in years
pub const AGE_AXIS_MAX: f64 = 2_000_000.0;

/// Chart width in pixels
const PLOT_WIDTH: u32 = 1200;

/// Creates the forest plot and saves it as a PNG file
///
/// Each row becomes one horizontal bar: a thick grey whisker from the 95%
/// lower bound to the 95% upper bound, with a black tick at the mean. The
/// X axis is fixed to [0, 2,000,000] and reversed so larger ages sit to the
/// left; gridlines are drawn for the X axis only.
///
/// # Arguments
/// * `records` - Summary rows to plot, in display order (top to bottom)
/// * `output_path` - Path where the PNG file should be saved
///
/// # Returns
/// * `Ok(())` - If the chart was successfully created and saved
/// * `Err(PlotError)` - If the data is empty/non-finite or rendering failed
///
/// # Headless Compatibility
/// Uses plotters' bitmap backend so rendering works in headless
/// environments (Docker/CI) without a display server.
pub fn create_forest_plot(records: &[NodeAgeSummary], output_path: &Path) -> Result<()> {
    if records.is_empty() {
        return Err(PlotError::InvalidData(
            "Summary table cannot be empty".to_string(),
        ));
    }
    for record in records {
        if !(record.mean.is_finite() && record.lower.is_finite() && record.upper.is_finite()) {
            return Err(PlotError::InvalidData(format!(
                "non-finite interval for taxon '{}'",
                record.taxon
            )));
        }
    }

    let height = (160 + 56 * records.len() as u32).max(400);
    let root = BitMapBackend::new(output_path, (PLOT_WIDTH, height));
    let drawing_area = root.into_drawing_area();

    drawing_area
        .fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    // Reversed X range puts the oldest ages on the left.
    let row_count = records.len() as i32;
    let mut chart_context = ChartBuilder::on(&drawing_area)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(140)
        .build_cartesian_2d(AGE_AXIS_MAX..0.0, (0..row_count).into_segmented())
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart_context
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Estimated age (Ma)")
        .x_label_style(("sans-serif", 20))
        .y_label_style(("sans-serif", 18))
        .y_labels(records.len())
        .y_label_formatter(&|segment| match segment {
            SegmentValue::Exact(idx) | SegmentValue::CenterOf(idx) => records
                .get(*idx as usize)
                .map(|r| r.taxon.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let whisker_style = RGBColor(0x93, 0x93, 0x93).stroke_width(10);
    let tick_style = BLACK.stroke_width(3);

    for (row, record) in records.iter().enumerate() {
        let row = row as i32;

        // Whisker spanning the 95% HDI.
        chart_context
            .draw_series(std::iter::once(PathElement::new(
                vec![
                    (record.lower, SegmentValue::CenterOf(row)),
                    (record.upper, SegmentValue::CenterOf(row)),
                ],
                whisker_style,
            )))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        // Tick at the mean, spanning the full row band.
        chart_context
            .draw_series(std::iter::once(PathElement::new(
                vec![
                    (record.mean, SegmentValue::Exact(row)),
                    (record.mean, SegmentValue::Exact(row + 1)),
                ],
                tick_style,
            )))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    drawing_area
        .present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}
