use super::canvas::rectangle;
use crate::layout::Rect;
use embedded_graphics::mono_font::iso_8859_1::{
    FONT_10X20, FONT_6X10, FONT_7X13_BOLD, FONT_9X15_BOLD,
};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Small,
    Medium,
    Bold,
    Large,
}

impl FontSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            FontSize::Small => &FONT_6X10,
            FontSize::Medium => &FONT_7X13_BOLD,
            FontSize::Bold => &FONT_9X15_BOLD,
            FontSize::Large => &FONT_10X20,
        }
    }

    pub fn line_height(&self) -> u32 {
        self.font().character_size.height
    }

    fn advance(&self) -> u32 {
        let font = self.font();
        font.character_size.width + font.character_spacing
    }

    /// How many characters fit in `width` pixels.
    pub fn chars_for(&self, width: u32) -> usize {
        let font = self.font();
        ((width + font.character_spacing) / self.advance()) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

pub fn text_width(text: &str, size: FontSize) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        0
    } else {
        count * size.advance() - size.font().character_spacing
    }
}

/// Cut `text` to at most `max_chars`, ending in `...` when shortened.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

pub fn fit_to_width(text: &str, size: FontSize, width: u32) -> String {
    truncate(text, size.chars_for(width))
}

/// Word-wrap into at most `max_rows` rows of `max_chars`. Overflow marks the
/// last row with an ellipsis; words longer than a row are split.
pub fn wrap(text: &str, max_chars: usize, max_rows: usize) -> Vec<String> {
    if max_chars == 0 || max_rows == 0 {
        return Vec::new();
    }
    let mut rows: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: String = word.to_string();
        loop {
            let line_len = line.chars().count();
            let word_len = word.chars().count();
            let needed = if line.is_empty() { word_len } else { line_len + 1 + word_len };
            if needed <= max_chars {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&word);
                break;
            }
            if line.is_empty() {
                // Hard-split a word wider than a whole row.
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                rows.push(head);
                if word.is_empty() {
                    break;
                }
            } else {
                rows.push(std::mem::take(&mut line));
            }
        }
    }
    if !line.is_empty() {
        rows.push(line);
    }

    if rows.len() > max_rows {
        rows.truncate(max_rows);
        if let Some(last) = rows.last_mut() {
            let marked = format!("{last}{ELLIPSIS}");
            *last = truncate(&marked, max_chars);
        }
    }
    rows
}

/// Draw one line inside `area`, clipped to it, truncated to its width.
pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    size: FontSize,
    area: Rect,
    h: HAlign,
    v: VAlign,
    color: BinaryColor,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if area.width == 0 || area.height == 0 || text.is_empty() {
        return Ok(());
    }
    let line = fit_to_width(text, size, area.width);
    let width = text_width(&line, size);
    let height = size.line_height();
    let x = match h {
        HAlign::Left => area.x,
        HAlign::Center => area.x + area.width.saturating_sub(width) / 2,
        HAlign::Right => area.x + area.width.saturating_sub(width),
    };
    let y = match v {
        VAlign::Top => area.y,
        VAlign::Middle => area.y + area.height.saturating_sub(height) / 2,
        VAlign::Bottom => area.y + area.height.saturating_sub(height),
    };
    let style = MonoTextStyle::new(size.font(), color);
    let mut clipped = target.clipped(&rectangle(area));
    Text::with_baseline(&line, Point::new(x as i32, y as i32), style, Baseline::Top)
        .draw(&mut clipped)?;
    Ok(())
}

/// Draw `lines` top-down from `area.y`; returns the y below the last row.
pub fn draw_lines<D>(
    target: &mut D,
    lines: &[String],
    size: FontSize,
    area: Rect,
    h: HAlign,
) -> Result<u32, D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let row = size.line_height();
    let mut y = area.y;
    for line in lines {
        if y + row > area.bottom() {
            break;
        }
        draw_text(
            target,
            line,
            size,
            Rect::new(area.x, y, area.width, row),
            h,
            VAlign::Top,
            BinaryColor::On,
        )?;
        y += row;
    }
    Ok(y)
}
