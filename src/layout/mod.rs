pub mod config;
pub mod grid;

pub use config::{
    daily_cell, hourly_cell, required_cells, CellGeometry, CellSpec, GridConfig, LayoutSpec,
    ALERTS, CALENDAR, CURRENT_CONDITIONS, FOOTER,
};
pub use grid::{resolve, BindError, CanvasSize, CellContent, Grid, GridCell, LayoutError, Rect};
