//! Skyline solid construction.
//!
//! Turns a weekly [`ActivityGrid`] into a printable CSG scene:
//! - A flared base: convex hull of a thin top plate and a wider bottom plate
//! - One bar per grid cell, height proportional to the cell value
//! - Two extruded labels lying flush on the sloped front face of the base
//!
//! The whole assembly is scaled by a single global factor.

use std::path::Path;

use geo::{coord, Rect};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkylineError};
use crate::scad;
use crate::scene::{HAlign, Node};
use crate::{ActivityGrid, GRID_DAYS, GRID_WEEKS};

/// Edge length of one bar footprint.
pub const CELL_SIZE: f64 = 1.5;
/// Spacing between neighbouring bars (negative: bars overlap slightly).
pub const CELL_GAP: f64 = -0.03;
/// Thickness of the top and bottom base plates.
pub const PLATE_THICKNESS: f64 = 0.1;
/// Z offset of the top plate, just below the bar floor.
pub const TOP_PLATE_Z: f64 = -0.01;
/// Bars start this far above the base top to avoid coincident faces.
pub const BAR_LIFT: f64 = 0.2;
/// Text size of both labels.
pub const LABEL_SIZE: f64 = 1.5;
/// Extrusion depth of the label text.
pub const LABEL_THICKNESS: f64 = 1.0;
/// Label anchor depth as a fraction of the base height.
const LABEL_DEPTH_RATIO: f64 = 0.75;

/// Configuration for skyline construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(default)]
pub struct SkylineConfig {
    /// Height of the flared base below the bars (default: 3.0)
    pub base_height: f64,
    /// Margin between the bar grid and the base edges (default: 0.75)
    pub border_spacing: f64,
    /// Left-aligned label on the front face
    pub label_left: String,
    /// Right-aligned label on the front face
    pub label_right: String,
    /// Height of the tallest bar (default: 20.0)
    pub max_bar_height: f64,
    /// Uniform scale applied to the whole model (default: 2.0)
    pub scale_factor: f64,
}

impl Default for SkylineConfig {
    fn default() -> Self {
        Self {
            base_height: 3.0,
            border_spacing: 0.75,
            label_left: String::new(),
            label_right: String::new(),
            max_bar_height: 20.0,
            scale_factor: 2.0,
        }
    }
}

impl SkylineConfig {
    /// Default geometry with the given labels.
    pub fn with_labels(label_left: impl Into<String>, label_right: impl Into<String>) -> Self {
        Self {
            label_left: label_left.into(),
            label_right: label_right.into(),
            ..Self::default()
        }
    }

    /// Check that every numeric parameter is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let params = [
            ("base_height", self.base_height),
            ("border_spacing", self.border_spacing),
            ("max_bar_height", self.max_bar_height),
            ("scale_factor", self.scale_factor),
        ];
        for (name, value) in params {
            if !value.is_finite() || value <= 0.0 {
                return Err(SkylineError::invalid_parameter(
                    name,
                    format!("must be a positive number, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Slope angle of the base's front face, in degrees.
///
/// The face rises `base_height` over a horizontal run of `border_spacing`.
pub fn flare_angle_degrees(base_height: f64, border_spacing: f64) -> f64 {
    (base_height / border_spacing).atan().to_degrees()
}

/// Derived dimensions of a skyline model, before the global scale.
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineGeometry {
    /// Bar grid extent along X (weeks)
    pub total_width: f64,
    /// Bar grid extent along Y (weekdays)
    pub total_depth: f64,
    /// Top plate width: grid plus one border on each side
    pub top_width: f64,
    /// Top plate depth: grid plus one border on each side
    pub top_depth: f64,
    /// Bottom plate width: top plate plus one more border on each side
    pub bottom_width: f64,
    /// Bottom plate depth: top plate plus one more border on each side
    pub bottom_depth: f64,
    /// Tilt of the front face from horizontal, in degrees
    pub flare_angle_deg: f64,
    /// Largest grid value, mapped to `max_bar_height`
    pub max_value: f64,
    /// Bar height per grid unit
    pub height_scale: f64,
    /// Base height (copied from the config)
    pub base_height: f64,
    /// Border between grid and top plate edge, and between plate edges
    pub border_spacing: f64,
    /// Height of the tallest bar
    pub max_bar_height: f64,
}

impl SkylineGeometry {
    /// Compute the model dimensions for a grid.
    ///
    /// Fails with [`SkylineError::EmptyGrid`] when no cell is positive and
    /// with [`SkylineError::InvalidParameter`] for non-positive parameters or
    /// negative / non-finite cells.
    pub fn new(grid: &ActivityGrid, config: &SkylineConfig) -> Result<Self> {
        config.validate()?;

        for (week, row) in grid.rows().iter().enumerate() {
            if let Some(day) = row.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(SkylineError::invalid_parameter(
                    "grid",
                    format!("cell ({}, {}) is {}", week, day, row[day]),
                ));
            }
        }

        let max_value = grid.max_value();
        if max_value <= 0.0 {
            return Err(SkylineError::EmptyGrid);
        }

        let b = config.border_spacing;
        let rows = GRID_WEEKS as f64;
        let cols = GRID_DAYS as f64;
        let total_width = rows * CELL_SIZE + (rows - 1.0) * CELL_GAP;
        let total_depth = cols * CELL_SIZE + (cols - 1.0) * CELL_GAP;
        let top_width = total_width + b * 2.0;
        let top_depth = total_depth + b * 2.0;

        Ok(Self {
            total_width,
            total_depth,
            top_width,
            top_depth,
            bottom_width: top_width + b * 2.0,
            bottom_depth: top_depth + b * 2.0,
            flare_angle_deg: flare_angle_degrees(config.base_height, b),
            max_value,
            height_scale: config.max_bar_height / max_value,
            base_height: config.base_height,
            border_spacing: b,
            max_bar_height: config.max_bar_height,
        })
    }

    /// Bar height for a grid value.
    ///
    /// Computed as a fraction of the maximum so the tallest bar lands exactly
    /// on `max_bar_height`.
    pub fn bar_height(&self, value: f64) -> f64 {
        self.max_bar_height * (value / self.max_value)
    }

    /// XY corner of the bar for a (week, weekday) cell.
    pub fn bar_origin(&self, week: usize, day: usize) -> (f64, f64) {
        let pitch = CELL_SIZE + CELL_GAP;
        let inset = 2.0 * self.border_spacing;
        (inset + week as f64 * pitch, inset + day as f64 * pitch)
    }

    pub fn bar_rect(&self, week: usize, day: usize) -> Rect<f64> {
        let (x, y) = self.bar_origin(week, day);
        Rect::new(coord! { x: x, y: y }, coord! { x: x + CELL_SIZE, y: y + CELL_SIZE })
    }

    /// Footprint covered by all bars.
    pub fn grid_rect(&self) -> Rect<f64> {
        let inset = 2.0 * self.border_spacing;
        Rect::new(
            coord! { x: inset, y: inset },
            coord! { x: inset + self.total_width, y: inset + self.total_depth },
        )
    }

    /// Footprint of the top plate of the base.
    pub fn top_rect(&self) -> Rect<f64> {
        let b = self.border_spacing;
        Rect::new(
            coord! { x: b, y: b },
            coord! { x: b + self.top_width, y: b + self.top_depth },
        )
    }

    /// Footprint of the bottom plate of the base.
    pub fn bottom_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: self.bottom_width, y: self.bottom_depth },
        )
    }
}

/// A built skyline: the CSG tree plus the dimensions it was built from.
#[derive(Debug, Clone)]
pub struct Scene {
    root: Node,
    geometry: SkylineGeometry,
}

impl Scene {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn geometry(&self) -> &SkylineGeometry {
        &self.geometry
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Render as OpenSCAD source.
    pub fn to_scad(&self) -> String {
        scad::to_scad(&self.root)
    }

    /// Write OpenSCAD source to `path`, creating parent directories.
    pub fn write_scad(&self, path: impl AsRef<Path>) -> Result<()> {
        scad::write_scad(&self.root, path.as_ref())
    }

    /// Render the CSG tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Write the JSON dump to `path`, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        scad::write_output(path.as_ref(), &self.to_json()?, "Scene JSON")
    }
}

fn flared_base(geom: &SkylineGeometry) -> Node {
    let b = geom.border_spacing;
    let top = Node::cube(geom.top_width, geom.top_depth, PLATE_THICKNESS).translate(b, b, TOP_PLATE_Z);
    let bottom = Node::cube(geom.bottom_width, geom.bottom_depth, PLATE_THICKNESS).translate(
        0.0,
        0.0,
        -geom.base_height,
    );
    Node::hull(vec![top, bottom])
}

fn skyline_bars(grid: &ActivityGrid, geom: &SkylineGeometry) -> Node {
    let mut bars = Vec::with_capacity(GRID_WEEKS * GRID_DAYS);
    for (week, row) in grid.rows().iter().enumerate() {
        for (day, value) in row.iter().enumerate() {
            let (x, y) = geom.bar_origin(week, day);
            bars.push(Node::cube(CELL_SIZE, CELL_SIZE, geom.bar_height(*value)).translate(x, y, BAR_LIFT));
        }
    }
    Node::union(bars)
}

// Label solid: anchored at (x, y, z), tilted by the flare angle so it lies
// on the sloped face.
fn label(text: &str, halign: HAlign, x: f64, y: f64, z: f64, flare_angle_deg: f64) -> Node {
    Node::text(text, LABEL_SIZE, halign)
        .linear_extrude(LABEL_THICKNESS)
        .rotate(flare_angle_deg, 0.0, 0.0)
        .translate(x, y, z)
}

/// Build the skyline scene for a grid.
///
/// # Example
/// ```
/// use activity_skyline::{build_scene, ActivityGrid, SkylineConfig};
///
/// let mut rows = vec![vec![0.0; 7]; 52];
/// rows[10][2] = 6.2;
/// let grid = ActivityGrid::from_rows(rows).unwrap();
///
/// let scene = build_scene(&grid, &SkylineConfig::with_labels("Me", "2024")).unwrap();
/// assert!((scene.geometry().flare_angle_deg - 75.96).abs() < 0.01);
/// assert!(scene.to_scad().contains("hull()"));
/// ```
pub fn build_scene(grid: &ActivityGrid, config: &SkylineConfig) -> Result<Scene> {
    let geom = SkylineGeometry::new(grid, config)?;
    let b = geom.border_spacing;
    let label_z = -geom.base_height * LABEL_DEPTH_RATIO;

    debug!(
        "[Skyline] Footprint {:.2}x{:.2}, base {:.2}x{:.2}, flare {:.2} deg, scale {:.4}",
        geom.total_width,
        geom.total_depth,
        geom.bottom_width,
        geom.bottom_depth,
        geom.flare_angle_deg,
        geom.height_scale
    );

    let model = Node::union(vec![
        flared_base(&geom),
        skyline_bars(grid, &geom),
        label(&config.label_left, HAlign::Left, b * 2.0, b, label_z, geom.flare_angle_deg),
        label(
            &config.label_right,
            HAlign::Right,
            geom.bottom_width - b * 2.0,
            b,
            label_z,
            geom.flare_angle_deg,
        ),
    ])
    .scale_uniform(config.scale_factor);

    Ok(Scene { root: model, geometry: geom })
}

/// Serialize a scene to an OpenSCAD file.
pub fn serialize(scene: &Scene, path: impl AsRef<Path>) -> Result<()> {
    scene.write_scad(path)
}

/// Build a scene and write it in one step.
///
/// Nothing is written when the grid or the configuration is rejected.
pub fn generate_skyline(
    grid: &ActivityGrid,
    config: &SkylineConfig,
    path: impl AsRef<Path>,
) -> Result<Scene> {
    let scene = build_scene(grid, config)?;
    serialize(&scene, path)?;
    Ok(scene)
}
