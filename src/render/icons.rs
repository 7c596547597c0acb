use super::text::{draw_text, FontSize, HAlign, VAlign};
use crate::layout::Rect;
use crate::model::Condition;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};

const MIN_ICON: u32 = 8;

fn ink(width: u32) -> PrimitiveStyle<BinaryColor> {
    PrimitiveStyle::with_stroke(BinaryColor::On, width)
}

/// Square drawing box centred in `area`.
struct Frame {
    x: i32,
    y: i32,
    s: i32,
}

impl Frame {
    fn of(area: Rect) -> Self {
        let s = area.width.min(area.height);
        Self {
            x: (area.x + (area.width - s) / 2) as i32,
            y: (area.y + (area.height - s) / 2) as i32,
            s: s as i32,
        }
    }

    /// Point at fractional coordinates (in 1/100ths) of the box.
    fn at(&self, fx: i32, fy: i32) -> Point {
        Point::new(self.x + self.s * fx / 100, self.y + self.s * fy / 100)
    }

    fn len(&self, f: i32) -> u32 {
        (self.s * f / 100).max(1) as u32
    }

    fn stroke(&self) -> u32 {
        (self.s / 24).max(1) as u32
    }
}

/// Draw the glyph for `condition` centred in `area`.
pub fn draw_condition<D>(target: &mut D, condition: Condition, area: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if area.width.min(area.height) < MIN_ICON {
        return Ok(());
    }
    let f = Frame::of(area);
    match condition {
        Condition::Clear => sun(target, &f, f.at(50, 50), 26),
        Condition::ClearNight => moon(target, &f, f.at(50, 50), 30),
        Condition::PartlyCloudy => {
            sun(target, &f, f.at(35, 35), 16)?;
            cloud(target, &f, 20, 40)
        }
        Condition::PartlyCloudyNight => {
            moon(target, &f, f.at(35, 35), 18)?;
            cloud(target, &f, 20, 40)
        }
        Condition::Cloudy => cloud(target, &f, 8, 25),
        Condition::Showers => {
            sun(target, &f, f.at(28, 25), 12)?;
            cloud(target, &f, 12, 15)?;
            drops(target, &f, 2)
        }
        Condition::Rain => {
            cloud(target, &f, 8, 10)?;
            drops(target, &f, 3)
        }
        Condition::Thunderstorm => {
            cloud(target, &f, 8, 10)?;
            bolt(target, &f)
        }
        Condition::Snow => {
            cloud(target, &f, 8, 10)?;
            flakes(target, &f)
        }
        Condition::Sleet => {
            cloud(target, &f, 8, 10)?;
            drops(target, &f, 2)?;
            flakes(target, &f)
        }
        Condition::Fog => lines(target, &f, &[(15, 85), (10, 90), (20, 80), (10, 75)]),
        Condition::Wind => lines(target, &f, &[(10, 70), (10, 90), (25, 80)]),
        Condition::Unknown => draw_text(
            target,
            "?",
            FontSize::Bold,
            area,
            HAlign::Center,
            VAlign::Middle,
            BinaryColor::On,
        ),
    }
}

fn sun<D>(target: &mut D, f: &Frame, center: Point, radius: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let r = f.s * radius / 100;
    Circle::with_center(center, (r * 2).max(2) as u32)
        .into_styled(ink(f.stroke()))
        .draw(target)?;
    // eight rays
    const DIRS: [(i32, i32); 8] = [
        (100, 0),
        (71, 71),
        (0, 100),
        (-71, 71),
        (-100, 0),
        (-71, -71),
        (0, -100),
        (71, -71),
    ];
    for (dx, dy) in DIRS {
        let inner = center + Point::new(dx * (r + 2) / 100, dy * (r + 2) / 100);
        let outer = center + Point::new(dx * (r * 3 / 2 + 2) / 100, dy * (r * 3 / 2 + 2) / 100);
        Line::new(inner, outer).into_styled(ink(f.stroke())).draw(target)?;
    }
    Ok(())
}

fn moon<D>(target: &mut D, f: &Frame, center: Point, radius: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let d = ((f.s * radius / 100) * 2).max(2) as u32;
    Circle::with_center(center, d)
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)?;
    let offset = Point::new(d as i32 / 3, -(d as i32) / 4);
    Circle::with_center(center + offset, d)
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
        .draw(target)
}

/// Filled cloud whose box starts at (`left`, `top`) percent of the frame.
fn cloud<D>(target: &mut D, f: &Frame, left: i32, top: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let width = 100 - 2 * left;
    let height = width / 2;
    let fill = PrimitiveStyle::with_fill(BinaryColor::On);
    let base_top = top + height / 2;
    Rectangle::new(f.at(left, base_top), Size::new(f.len(width), f.len(height / 2)))
        .into_styled(fill)
        .draw(target)?;
    Circle::with_center(f.at(left + width / 4, base_top), f.len(height))
        .into_styled(fill)
        .draw(target)?;
    Circle::with_center(f.at(left + width * 11 / 20, top + height / 3), f.len(height * 3 / 2))
        .into_styled(fill)
        .draw(target)?;
    Circle::with_center(f.at(left + width * 4 / 5, base_top), f.len(height))
        .into_styled(fill)
        .draw(target)
}

fn drops<D>(target: &mut D, f: &Frame, count: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let step = 60 / count.max(1);
    for i in 0..count {
        let x = 25 + step / 2 + i * step;
        Line::new(f.at(x + 5, 68), f.at(x - 3, 90))
            .into_styled(ink(f.stroke() + 1))
            .draw(target)?;
    }
    Ok(())
}

fn bolt<D>(target: &mut D, f: &Frame) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = ink(f.stroke() + 1);
    Line::new(f.at(55, 62), f.at(42, 78)).into_styled(style).draw(target)?;
    Line::new(f.at(42, 78), f.at(56, 78)).into_styled(style).draw(target)?;
    Line::new(f.at(56, 78), f.at(44, 96)).into_styled(style).draw(target)
}

fn flakes<D>(target: &mut D, f: &Frame) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    for (x, y) in [(30, 75), (50, 88), (70, 75)] {
        Circle::with_center(f.at(x, y), f.len(9).max(3))
            .into_styled(ink(1))
            .draw(target)?;
    }
    Ok(())
}

fn lines<D>(target: &mut D, f: &Frame, spans: &[(i32, i32)]) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let gap = 60 / spans.len().max(1) as i32;
    for (i, (from, to)) in spans.iter().enumerate() {
        let y = 25 + gap / 2 + i as i32 * gap;
        Line::new(f.at(*from, y), f.at(*to, y))
            .into_styled(ink(f.stroke() + 1))
            .draw(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CanvasSize;
    use crate::render::canvas::{Canvas, INK};

    const ALL: [Condition; 13] = [
        Condition::Clear,
        Condition::ClearNight,
        Condition::PartlyCloudy,
        Condition::PartlyCloudyNight,
        Condition::Cloudy,
        Condition::Showers,
        Condition::Rain,
        Condition::Thunderstorm,
        Condition::Snow,
        Condition::Sleet,
        Condition::Fog,
        Condition::Wind,
        Condition::Unknown,
    ];

    #[test]
    fn every_condition_has_a_glyph() {
        for condition in ALL {
            let mut canvas = Canvas::new(CanvasSize::new(120, 120));
            let area = Rect::new(30, 30, 60, 60);
            let mut clipped = canvas.clipped(&crate::render::canvas::rectangle(area));
            draw_condition(&mut clipped, condition, area).unwrap();
            let image = canvas.into_image();
            let inked = image.pixels().filter(|p| **p == INK).count();
            assert!(inked > 0, "{condition:?} drew nothing");
        }
    }

    #[test]
    fn tiny_area_draws_nothing() {
        let mut canvas = Canvas::new(CanvasSize::new(10, 10));
        draw_condition(&mut canvas, Condition::Rain, Rect::new(0, 0, 4, 4)).unwrap();
        assert!(canvas.image().pixels().all(|p| *p != INK));
    }
}
