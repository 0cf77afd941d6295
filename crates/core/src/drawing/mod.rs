//! Grid-snapped polygon editor
//!
//! Backs the map builders: an administrator clicks points on a canvas and the
//! editor turns them into an open polyline or a closed outline. Points are
//! snapped to the grid as they arrive, and a click near the first point
//! closes the outline.

mod replay;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub use replay::{replay, DraftFinish, DraftStep};

/// Smallest grid size the builders allow
pub const MIN_GRID_SIZE: u32 = 10;

/// Largest grid size the builders allow
pub const MAX_GRID_SIZE: u32 = 50;

/// Grid size used when none is configured
pub const DEFAULT_GRID_SIZE: u32 = 20;

/// Clicks closer than this many grid cells to the first point close the outline
const CLOSE_RADIUS_CELLS: f64 = 2.0;

/// A point in canvas space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Round a coordinate to the nearest multiple of `grid`; halves round up
pub fn snap_coord(value: f64, grid: f64) -> f64 {
    (value / grid + 0.5).floor() * grid
}

/// Snap a point to the nearest grid intersection
pub fn snap(point: Point, grid_size: u32) -> Point {
    let grid = f64::from(grid_size);
    Point::new(snap_coord(point.x, grid), snap_coord(point.y, grid))
}

/// Check that a grid size is inside the configurable range
pub fn validate_grid_size(grid_size: u32) -> Result<()> {
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
        return Err(Error::Validation(format!(
            "Grid size must be between {} and {}, got {}",
            MIN_GRID_SIZE, MAX_GRID_SIZE, grid_size
        )));
    }
    Ok(())
}

/// Ordered points plus whether the outline is closed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Result of feeding one click into the editor
#[derive(Debug, Clone, PartialEq)]
pub enum Click {
    /// The (snapped) point was appended
    Appended(Point),
    /// The click landed near the first point; the outline is finished
    Closed(Outline),
}

/// How a drawing session should be finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinishMode {
    #[default]
    Open,
    Closed,
}

impl FinishMode {
    /// Fewest points an outline needs to be finished this way
    pub fn min_points(self) -> usize {
        match self {
            FinishMode::Open => 2,
            FinishMode::Closed => 3,
        }
    }
}

/// Click-by-click outline builder
#[derive(Debug, Clone)]
pub struct ShapeEditor {
    grid_size: u32,
    snap_enabled: bool,
    points: Vec<Point>,
}

impl Default for ShapeEditor {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_enabled: true,
            points: Vec::new(),
        }
    }
}

impl ShapeEditor {
    pub fn new(grid_size: u32) -> Result<Self> {
        validate_grid_size(grid_size)?;
        Ok(Self {
            grid_size,
            ..Self::default()
        })
    }

    pub fn with_snap(mut self, enabled: bool) -> Self {
        self.snap_enabled = enabled;
        self
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Change the grid size. Already placed points keep their coordinates;
    /// only later clicks see the new grid.
    pub fn set_grid_size(&mut self, grid_size: u32) -> Result<()> {
        validate_grid_size(grid_size)?;
        self.grid_size = grid_size;
        Ok(())
    }

    pub fn set_snap(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Feed one canvas click into the editor
    pub fn click(&mut self, raw: Point) -> Click {
        let point = if self.snap_enabled {
            snap(raw, self.grid_size)
        } else {
            raw
        };

        if self.closes_on(point) {
            let outline = Outline {
                points: std::mem::take(&mut self.points),
                closed: true,
            };
            debug!(points = outline.points.len(), "Outline closed on first point");
            return Click::Closed(outline);
        }

        self.points.push(point);
        Click::Appended(point)
    }

    /// Remove the most recently placed point, if any
    pub fn undo(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Finish the current outline. With too few points for `mode` the
    /// drawing is discarded and `None` is returned.
    pub fn finish(&mut self, mode: FinishMode) -> Option<Outline> {
        let points = std::mem::take(&mut self.points);
        if points.len() < mode.min_points() {
            debug!(points = points.len(), ?mode, "Discarding outline with too few points");
            return None;
        }
        Some(Outline {
            points,
            closed: mode == FinishMode::Closed,
        })
    }

    /// Close a building footprint. Unlike [`finish`](Self::finish), too few
    /// points is reported to the user and the drawing is kept.
    pub fn close_building(&mut self) -> Result<Outline> {
        let needed = FinishMode::Closed.min_points();
        if self.points.len() < needed {
            return Err(Error::Validation(format!(
                "A building outline needs at least {} points, {} placed",
                needed,
                self.points.len()
            )));
        }
        Ok(Outline {
            points: std::mem::take(&mut self.points),
            closed: true,
        })
    }

    /// Drop all placed points
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// A click closes the outline from the third click onward when it lands
    /// within two grid cells of the first point
    fn closes_on(&self, point: Point) -> bool {
        if self.points.len() < 2 {
            return false;
        }
        let threshold = CLOSE_RADIUS_CELLS * f64::from(self.grid_size);
        self.points[0].distance_to(point) < threshold
    }
}
