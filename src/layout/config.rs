use serde::{Deserialize, Serialize};

pub const CURRENT_CONDITIONS: &str = "current_conditions";
pub const ALERTS: &str = "alerts";
pub const CALENDAR: &str = "calendar";
pub const FOOTER: &str = "footer";

pub fn hourly_cell(index: usize) -> String {
    format!("hourly_{index}")
}

pub fn daily_cell(index: usize) -> String {
    format!("daily_{index}")
}

/// Cells every dashboard layout must define. `footer` is optional.
pub fn required_cells() -> Vec<String> {
    let mut names = vec![CURRENT_CONDITIONS.to_string()];
    names.extend((1..=crate::model::HOURLY_LEN).map(hourly_cell));
    names.extend((1..=crate::model::DAILY_LEN).map(daily_cell));
    names.push(ALERTS.to_string());
    names.push(CALENDAR.to_string());
    names
}

fn default_rows() -> u16 {
    1
}

fn default_cols() -> u16 {
    1
}

fn default_span() -> u16 {
    1
}

/// Uniform track grid used by `Track` geometries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridConfig {
    #[serde(default = "default_rows")]
    pub rows: u16,
    #[serde(default = "default_cols")]
    pub cols: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CellGeometry {
    /// Fractions of the canvas, each in `[0, 1]`.
    Fraction {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Pixels {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Track {
        row: u16,
        col: u16,
        #[serde(default = "default_span")]
        row_span: u16,
        #[serde(default = "default_span")]
        col_span: u16,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellSpec {
    pub name: String,
    pub geometry: CellGeometry,
}

impl CellSpec {
    pub fn new(name: impl Into<String>, geometry: CellGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    pub fn track(name: impl Into<String>, row: u16, col: u16) -> Self {
        Self::new(
            name,
            CellGeometry::Track {
                row,
                col,
                row_span: 1,
                col_span: 1,
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LayoutSpec {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub cells: Vec<CellSpec>,
}

const BASE_WIDTH: f64 = 640.0;
const BASE_HEIGHT: f64 = 384.0;

// Geometry measured on the 640x384 panel, stored as fractions so it scales.
fn frac(x: u32, y: u32, width: u32, height: u32) -> CellGeometry {
    CellGeometry::Fraction {
        x: x as f64 / BASE_WIDTH,
        y: y as f64 / BASE_HEIGHT,
        width: width as f64 / BASE_WIDTH,
        height: height as f64 / BASE_HEIGHT,
    }
}

impl LayoutSpec {
    /// The stock dashboard: current conditions and the first day top left,
    /// a strip of hourly cells, the remaining days below, the calendar down
    /// the right side, and the alert and footer bands along the bottom.
    pub fn dashboard() -> Self {
        let mut cells = vec![
            CellSpec::new(CURRENT_CONDITIONS, frac(20, 8, 190, 96)),
            CellSpec::new(daily_cell(1), frac(214, 8, 216, 96)),
        ];
        for i in 0..crate::model::HOURLY_LEN as u32 {
            cells.push(CellSpec::new(
                hourly_cell(i as usize + 1),
                frac(20 + i * 59, 108, 58, 98),
            ));
        }
        for i in 0..(crate::model::DAILY_LEN as u32 - 1) {
            cells.push(CellSpec::new(
                daily_cell(i as usize + 2),
                frac(20 + i * 138, 210, 136, 140),
            ));
        }
        cells.push(CellSpec::new(CALENDAR, frac(440, 8, 192, 342)));
        cells.push(CellSpec::new(ALERTS, frac(20, 352, 612, 18)));
        cells.push(CellSpec::new(FOOTER, frac(10, 372, 620, 12)));
        Self {
            grid: GridConfig::default(),
            cells,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.iter().any(|c| c.name == name)
    }
}
