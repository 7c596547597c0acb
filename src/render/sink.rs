use crate::layout::CanvasSize;
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    Unavailable(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Unavailable(reason) => write!(f, "render sink unavailable: {reason}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Destination of a finished raster.
pub trait RenderSink: Send {
    fn name(&self) -> &str;

    fn present(&mut self, raster: &GrayImage) -> Result<(), SinkError>;
}

/// Writes the raster as BMP or PNG, chosen by the path's extension.
pub struct FileSink {
    path: PathBuf,
    format: ImageFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let format = match ImageFormat::from_path(&path) {
            Ok(f @ (ImageFormat::Bmp | ImageFormat::Png)) => f,
            _ => anyhow::bail!(
                "unsupported output format for {}, use .bmp or .png",
                path.display()
            ),
        };
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn present(&mut self, raster: &GrayImage) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SinkError::Unavailable(format!("create {}: {e}", parent.display())))?;
        }
        // Write beside the target and rename so readers never see a partial image.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        raster
            .save_with_format(&tmp, self.format)
            .map_err(|e| SinkError::Unavailable(format!("encode {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| SinkError::Unavailable(format!("replace {}: {e}", self.path.display())))
    }
}

/// Supported panels and their native resolutions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DisplayModel {
    #[serde(rename = "epd7in5")]
    Epd7in5,
    #[serde(rename = "epd7in5_v2")]
    Epd7in5V2,
}

impl DisplayModel {
    pub fn size(&self) -> CanvasSize {
        match self {
            DisplayModel::Epd7in5 => CanvasSize::new(640, 384),
            DisplayModel::Epd7in5V2 => CanvasSize::new(800, 480),
        }
    }
}

impl Default for DisplayModel {
    fn default() -> Self {
        DisplayModel::Epd7in5
    }
}

/// Raster packed one bit per pixel, rows padded to whole bytes, MSB first,
/// a set bit meaning white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

pub fn pack_1bpp(raster: &GrayImage) -> PackedFrame {
    let (width, height) = raster.dimensions();
    let stride = ((width + 7) / 8) as usize;
    let mut bytes = vec![0u8; stride * height as usize];
    for (x, y, pixel) in raster.enumerate_pixels() {
        if pixel.0[0] >= 128 {
            bytes[y as usize * stride + x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    PackedFrame {
        width,
        height,
        bytes,
    }
}

/// Hardware side of a panel.
pub trait DisplayDriver: Send {
    fn show(&mut self, frame: &PackedFrame) -> std::io::Result<()>;
}

/// Writes packed frames to a device node or FIFO served by the panel driver.
pub struct DeviceFileDriver {
    path: PathBuf,
}

impl DeviceFileDriver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DisplayDriver for DeviceFileDriver {
    fn show(&mut self, frame: &PackedFrame) -> std::io::Result<()> {
        let mut device = OpenOptions::new().write(true).open(&self.path)?;
        device.write_all(&frame.bytes)?;
        device.flush()
    }
}

pub struct DisplaySink<D: DisplayDriver> {
    driver: D,
    model: DisplayModel,
}

impl<D: DisplayDriver> DisplaySink<D> {
    pub fn new(driver: D, model: DisplayModel) -> Self {
        Self { driver, model }
    }
}

impl<D: DisplayDriver> RenderSink for DisplaySink<D> {
    fn name(&self) -> &str {
        "display"
    }

    fn present(&mut self, raster: &GrayImage) -> Result<(), SinkError> {
        let expected = self.model.size();
        if raster.dimensions() != (expected.width, expected.height) {
            return Err(SinkError::Unavailable(format!(
                "raster is {}x{}, display {:?} needs {}x{}",
                raster.width(),
                raster.height(),
                self.model,
                expected.width,
                expected.height
            )));
        }
        let frame = pack_1bpp(raster);
        self.driver
            .show(&frame)
            .map_err(|e| SinkError::Unavailable(format!("display write failed: {e}")))
    }
}
