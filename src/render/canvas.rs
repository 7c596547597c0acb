use crate::layout::{CanvasSize, Rect};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use image::{GrayImage, Luma};
use std::convert::Infallible;

pub const INK: Luma<u8> = Luma([0]);
pub const PAPER: Luma<u8> = Luma([255]);

/// One-bit drawing surface backed by a luma image. `BinaryColor::On` is ink.
pub struct Canvas {
    image: GrayImage,
}

impl Canvas {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            image: GrayImage::from_pixel(size.width, size.height, PAPER),
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < width && y < height {
                let value = if color.is_on() { INK } else { PAPER };
                self.image.put_pixel(x, y, value);
            }
        }
        Ok(())
    }
}

pub fn rectangle(rect: Rect) -> Rectangle {
    Rectangle::new(
        Point::new(rect.x as i32, rect.y as i32),
        Size::new(rect.width, rect.height),
    )
}

pub fn fill<D>(target: &mut D, rect: Rect, color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    rectangle(rect)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

pub fn outline<D>(target: &mut D, rect: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    rectangle(rect)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)
}
