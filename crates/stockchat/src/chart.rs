//! Price chart rendering

use crate::config::DEFAULT_CHART_PATH;
use crate::error::{ChatError, Result};
use crate::series::PriceSeries;
use chrono::{Days, NaiveDate};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// A chart written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartArtifact {
    /// Location of the SVG document
    pub path: PathBuf,
    /// Ticker the chart shows
    pub ticker: String,
    /// Number of plotted observations
    pub points: usize,
}

/// Renders a closing-price line chart to a fixed path
///
/// Each render overwrites the previous artifact.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_PATH)
    }
}

fn chart_err(e: impl std::fmt::Display) -> ChatError {
    ChatError::Chart(e.to_string())
}

impl ChartRenderer {
    /// 800x500 renderer writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: 800,
            height: 500,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chart title for a ticker
    pub fn title(ticker: &str) -> String {
        format!("{ticker} Stock Price Over Past Year")
    }

    /// Draw `series` and write it to the configured path
    pub fn render(&self, series: &PriceSeries) -> Result<ChartArtifact> {
        let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
            return Err(ChatError::Chart(format!(
                "no price data to plot for {}",
                series.ticker()
            )));
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(chart_err)?;
            }
        }

        let x_end = if first == last {
            last.checked_add_days(Days::new(1)).unwrap_or(last)
        } else {
            last
        };
        let (y_min, y_max) = price_bounds(series);

        let root = SVGBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(Self::title(series.ticker()), ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(first..x_end, y_min..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price ($)")
            .x_labels(8)
            .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(
                series.points().iter().map(|p| (p.date, p.close)),
                &BLUE,
            ))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;

        info!(
            ticker = series.ticker(),
            points = series.len(),
            path = %self.path.display(),
            "Chart written"
        );

        Ok(ChartArtifact {
            path: self.path.clone(),
            ticker: series.ticker().to_string(),
            points: series.len(),
        })
    }
}

/// Padded y-axis range
fn price_bounds(series: &PriceSeries) -> (f64, f64) {
    let (lo, hi) = series
        .points()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.close), hi.max(p.close))
        });
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}
