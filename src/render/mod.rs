pub mod canvas;
pub mod icons;
pub mod sink;
pub mod text;

pub use canvas::Canvas;
pub use sink::{
    pack_1bpp, DeviceFileDriver, DisplayDriver, DisplayModel, DisplaySink, FileSink, PackedFrame,
    RenderSink, SinkError,
};
pub use text::{FontSize, HAlign, VAlign};
