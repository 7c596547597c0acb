use super::config::{CellGeometry, CellSpec, LayoutSpec};
use crate::model::{Alert, CurrentConditions, DayPoint, Event, HourPoint};
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn within(&self, canvas: CanvasSize) -> bool {
        self.right() <= canvas.width && self.bottom() <= canvas.height
    }

    /// Shrink by `margin` on every side, never below zero size.
    pub fn inset(&self, margin: u32) -> Rect {
        let dx = margin.min(self.width / 2);
        let dy = margin.min(self.height / 2);
        Rect::new(
            self.x + dx,
            self.y + dy,
            self.width - 2 * dx,
            self.height - 2 * dy,
        )
    }
}

/// What a cell shows during one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Current(CurrentConditions),
    Hour(HourPoint),
    Day(DayPoint),
    Alerts(Vec<Alert>),
    Calendar(Vec<Event>),
    Footer {
        provider: String,
        updated_at: DateTime<Tz>,
    },
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub name: String,
    pub bounds: Rect,
    pub occupied_by: Option<CellContent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    Overlap { first: String, second: String },
    OutOfBounds { cell: String },
    InvalidFraction { cell: String },
    ZeroArea { cell: String },
    DuplicateCell { cell: String },
    MissingCell { cell: String },
    EmptyGrid { cell: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Overlap { first, second } => {
                write!(f, "cells '{first}' and '{second}' overlap")
            }
            LayoutError::OutOfBounds { cell } => {
                write!(f, "cell '{cell}' extends past the canvas")
            }
            LayoutError::InvalidFraction { cell } => {
                write!(f, "cell '{cell}' has a fraction outside [0, 1]")
            }
            LayoutError::ZeroArea { cell } => write!(f, "cell '{cell}' has zero area"),
            LayoutError::DuplicateCell { cell } => write!(f, "cell '{cell}' is defined twice"),
            LayoutError::MissingCell { cell } => write!(f, "required cell '{cell}' is missing"),
            LayoutError::EmptyGrid { cell } => {
                write!(f, "cell '{cell}' uses tracks but the grid has no rows or columns")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[derive(Debug, Clone, PartialEq)]
pub enum BindError {
    AlreadyBound { cell: String },
    UnknownCell { cell: String },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::AlreadyBound { cell } => write!(f, "cell '{cell}' is already bound"),
            BindError::UnknownCell { cell } => write!(f, "no cell named '{cell}'"),
        }
    }
}

impl std::error::Error for BindError {}

/// Resolve every cell of `spec` to pixel bounds on `canvas`.
///
/// Pure: the same spec and canvas always produce the same cells.
pub fn resolve(spec: &LayoutSpec, canvas: CanvasSize) -> Result<Vec<GridCell>, LayoutError> {
    let mut seen = HashSet::new();
    let mut cells: Vec<GridCell> = Vec::with_capacity(spec.cells.len());

    for cell in &spec.cells {
        if !seen.insert(cell.name.as_str()) {
            return Err(LayoutError::DuplicateCell {
                cell: cell.name.clone(),
            });
        }
        let bounds = resolve_cell(cell, spec, canvas)?;
        if bounds.width == 0 || bounds.height == 0 {
            return Err(LayoutError::ZeroArea {
                cell: cell.name.clone(),
            });
        }
        if !bounds.within(canvas) {
            return Err(LayoutError::OutOfBounds {
                cell: cell.name.clone(),
            });
        }
        if let Some(other) = cells.iter().find(|c| c.bounds.intersects(&bounds)) {
            return Err(LayoutError::Overlap {
                first: other.name.clone(),
                second: cell.name.clone(),
            });
        }
        cells.push(GridCell {
            name: cell.name.clone(),
            bounds,
            occupied_by: None,
        });
    }

    Ok(cells)
}

fn resolve_cell(
    cell: &CellSpec,
    spec: &LayoutSpec,
    canvas: CanvasSize,
) -> Result<Rect, LayoutError> {
    match cell.geometry {
        CellGeometry::Fraction {
            x,
            y,
            width,
            height,
        } => {
            let valid = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
            if ![x, y, width, height].into_iter().all(valid) {
                return Err(LayoutError::InvalidFraction {
                    cell: cell.name.clone(),
                });
            }
            const EPSILON: f64 = 1e-9;
            if x + width > 1.0 + EPSILON || y + height > 1.0 + EPSILON {
                return Err(LayoutError::OutOfBounds {
                    cell: cell.name.clone(),
                });
            }
            // Edges round independently so neighbours sharing an edge tile exactly.
            let (x0, x1) = fraction_edges(x, width, canvas.width);
            let (y0, y1) = fraction_edges(y, height, canvas.height);
            Ok(Rect::new(x0, y0, x1 - x0, y1 - y0))
        }
        CellGeometry::Pixels {
            x,
            y,
            width,
            height,
        } => {
            let fits = x
                .checked_add(width)
                .zip(y.checked_add(height))
                .map_or(false, |(r, b)| r <= canvas.width && b <= canvas.height);
            if width == 0 || height == 0 {
                return Err(LayoutError::ZeroArea {
                    cell: cell.name.clone(),
                });
            }
            if !fits {
                return Err(LayoutError::OutOfBounds {
                    cell: cell.name.clone(),
                });
            }
            Ok(Rect::new(x, y, width, height))
        }
        CellGeometry::Track {
            row,
            col,
            row_span,
            col_span,
        } => {
            let rows = spec.grid.rows as u32;
            let cols = spec.grid.cols as u32;
            if rows == 0 || cols == 0 {
                return Err(LayoutError::EmptyGrid {
                    cell: cell.name.clone(),
                });
            }
            if row_span == 0 || col_span == 0 {
                return Err(LayoutError::ZeroArea {
                    cell: cell.name.clone(),
                });
            }
            let (row, col) = (row as u32, col as u32);
            let (row_end, col_end) = (row + row_span as u32, col + col_span as u32);
            if row_end > rows || col_end > cols {
                return Err(LayoutError::OutOfBounds {
                    cell: cell.name.clone(),
                });
            }
            let x0 = track_edge(col, cols, canvas.width);
            let x1 = track_edge(col_end, cols, canvas.width);
            let y0 = track_edge(row, rows, canvas.height);
            let y1 = track_edge(row_end, rows, canvas.height);
            Ok(Rect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }
}

fn fraction_edges(start: f64, extent: f64, total: u32) -> (u32, u32) {
    let total_f = total as f64;
    // Snap away float noise first so `a + (b - a)` and `b` land on the same pixel.
    let edge = |f: f64| {
        let px = ((f * total_f) * 1e6).round() / 1e6;
        px.round().clamp(0.0, total_f) as u32
    };
    let lo = edge(start);
    let hi = edge(start + extent);
    (lo, hi.max(lo))
}

fn track_edge(index: u32, count: u32, total: u32) -> u32 {
    (index as u64 * total as u64 / count as u64) as u32
}

/// Resolved cells plus their per-cycle bindings.
#[derive(Debug, Clone)]
pub struct Grid {
    canvas: CanvasSize,
    cells: Vec<GridCell>,
}

impl Grid {
    pub fn new(spec: &LayoutSpec, canvas: CanvasSize) -> Result<Self, LayoutError> {
        Ok(Self {
            canvas,
            cells: resolve(spec, canvas)?,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, name: &str) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.name == name)
    }

    /// Fail with `MissingCell` for the first of `names` the grid lacks.
    pub fn require<I, S>(&self, names: I) -> Result<(), LayoutError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if self.cell(name).is_none() {
                return Err(LayoutError::MissingCell {
                    cell: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn bind(&mut self, name: &str, content: CellContent) -> Result<(), BindError> {
        let cell = self
            .cells
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| BindError::UnknownCell {
                cell: name.to_string(),
            })?;
        if cell.occupied_by.is_some() {
            return Err(BindError::AlreadyBound {
                cell: name.to_string(),
            });
        }
        cell.occupied_by = Some(content);
        Ok(())
    }

    /// Take back whatever is bound to `name`.
    pub fn unbind(&mut self, name: &str) -> Option<CellContent> {
        self.cells
            .iter_mut()
            .find(|c| c.name == name)
            .and_then(|c| c.occupied_by.take())
    }

    pub fn clear_bindings(&mut self) {
        for cell in &mut self.cells {
            cell.occupied_by = None;
        }
    }

    /// Names from `names` whose cell exists but has nothing bound.
    pub fn unbound<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                match self.cell(name) {
                    Some(cell) if cell.occupied_by.is_none() => Some(name.to_string()),
                    _ => None,
                }
            })
            .collect()
    }
}
