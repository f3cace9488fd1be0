//! Plot point data model
//!
//! Plot data is a JSON array of `{ "px": .., "py": .., "pz": .. }` records.
//! Order is significant: the viewer connects points into a polyline in
//! input order.

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SAMPLE_DATA: &str = include_str!("../assets/sample.json");

/// A single plotted point in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotPoint {
    pub px: f32,
    pub py: f32,
    pub pz: f32,
}

impl PlotPoint {
    pub fn new(px: f32, py: f32, pz: f32) -> Self {
        Self { px, py, pz }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.px, self.py, self.pz]
    }
}

/// Decode plot points from a JSON string
pub fn parse_plot_points(json: &str) -> Result<Vec<PlotPoint>, DataError> {
    let points: Vec<PlotPoint> = serde_json::from_str(json)?;
    tracing::debug!("Parsed {} plot points", points.len());
    Ok(points)
}

/// Load plot points from a JSON file
pub fn load_plot_points(path: &Path) -> Result<Vec<PlotPoint>, DataError> {
    let content = std::fs::read_to_string(path)?;
    let points = parse_plot_points(&content)?;
    tracing::info!("Loaded {} plot points from {}", points.len(), path.display());
    Ok(points)
}

/// The dataset bundled with the viewer
pub fn sample_plot_points() -> Result<Vec<PlotPoint>, DataError> {
    parse_plot_points(SAMPLE_DATA)
}
