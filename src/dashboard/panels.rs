//! Drawing for each kind of cell content.

use crate::layout::{CanvasSize, CellContent, Grid, Rect};
use crate::model::{Alert, CurrentConditions, DayPoint, DaySlot, Event, HourPoint};
use crate::render::canvas::{fill, outline, Canvas};
use crate::render::icons::draw_condition;
use crate::render::text::{draw_lines, draw_text, fit_to_width, text_width, wrap};
use crate::render::{FontSize, HAlign, VAlign};
use chrono::DateTime;
use chrono_tz::Tz;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use image::GrayImage;

const DAY_SUMMARY_ROWS: usize = 3;
const EVENT_TITLE_ROWS: usize = 2;
const DATE_COLUMN: u32 = 34;

/// Draw every bound cell of `grid`, each clipped to its bounds.
pub fn render(grid: &Grid, now: DateTime<Tz>) -> GrayImage {
    let mut canvas = Canvas::new(grid.canvas());
    for cell in grid.cells() {
        let Some(content) = &cell.occupied_by else {
            continue;
        };
        let mut clipped = canvas.clipped(&crate::render::canvas::rectangle(cell.bounds));
        if let Err(never) = draw_content(&mut clipped, content, cell.bounds, now) {
            match never {}
        }
    }
    canvas.into_image()
}

fn draw_content<D>(
    target: &mut D,
    content: &CellContent,
    area: Rect,
    now: DateTime<Tz>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match content {
        CellContent::Current(current) => draw_current(target, current, area),
        CellContent::Hour(hour) => draw_hour(target, hour, area),
        CellContent::Day(day) => draw_day(target, day, area),
        CellContent::Alerts(alerts) => draw_alerts(target, alerts, area, now),
        CellContent::Calendar(events) => draw_calendar(target, events, area),
        CellContent::Footer {
            provider,
            updated_at,
        } => draw_footer(target, provider, *updated_at, area),
        CellContent::Placeholder(message) => draw_placeholder(target, message, area),
    }
}

fn row(area: Rect, y: u32, height: u32) -> Rect {
    let y = y.min(area.bottom());
    Rect::new(area.x, y, area.width, height.min(area.bottom() - y))
}

fn draw_current<D>(target: &mut D, current: &CurrentConditions, area: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let small = FontSize::Small.line_height();
    draw_text(
        target,
        &current.summary,
        FontSize::Medium,
        row(area, area.y, FontSize::Medium.line_height()),
        HAlign::Left,
        VAlign::Top,
        BinaryColor::On,
    )?;
    let body_top = area.y + FontSize::Medium.line_height() + 2;
    let body = Rect::new(area.x, body_top, area.width, area.bottom().saturating_sub(body_top));
    let icon = Rect::new(body.x, body.y, body.width * 2 / 5, body.height);
    draw_condition(target, current.condition, icon.inset(2))?;

    let info = Rect::new(icon.right(), body.y, body.width - icon.width, body.height);
    draw_text(
        target,
        &current.temperature.with_symbol(),
        FontSize::Large,
        row(info, info.y, FontSize::Large.line_height()),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )?;
    let mut lines = Vec::new();
    if let Some(feels) = &current.feels_like {
        lines.push(format!("Feels like {feels}"));
    }
    if let Some(humidity) = current.humidity {
        lines.push(format!("Humidity {}%", humidity.round() as i64));
    }
    if let Some(wind) = &current.wind {
        lines.push(format!("Wind {wind}"));
    }
    let text_top = info.y + FontSize::Large.line_height() + 2;
    draw_lines(
        target,
        &lines,
        FontSize::Small,
        Rect::new(
            info.x,
            text_top,
            info.width,
            (small * 3).min(area.bottom().saturating_sub(text_top)),
        ),
        HAlign::Center,
    )?;
    Ok(())
}

fn draw_hour<D>(target: &mut D, hour: &HourPoint, area: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let small = FontSize::Small.line_height();
    let medium = FontSize::Medium.line_height();
    let label = hour.time.format("%-I %P").to_string();
    draw_text(
        target,
        &label,
        FontSize::Small,
        row(area, area.y, small),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )?;

    let footer = medium + if hour.precipitation_probability.is_some() { small } else { 0 };
    let icon_top = area.y + small + 2;
    let icon_height = area.bottom().saturating_sub(icon_top + footer + 2);
    let icon = Rect::new(area.x, icon_top, area.width, icon_height).inset(2);
    draw_condition(target, hour.condition, icon)?;

    let temp_top = area.bottom().saturating_sub(footer);
    draw_text(
        target,
        &hour.temperature.to_string(),
        FontSize::Medium,
        row(area, temp_top, medium),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )?;
    if let Some(pop) = hour.precipitation_probability {
        draw_text(
            target,
            &format!("{}%", pop.round() as i64),
            FontSize::Small,
            row(area, temp_top + medium, small),
            HAlign::Center,
            VAlign::Top,
            BinaryColor::On,
        )?;
    }
    Ok(())
}

fn day_heading(day: &DayPoint) -> String {
    match day.slot {
        DaySlot::Today => "Today".to_string(),
        DaySlot::Tonight => "Tonight".to_string(),
        DaySlot::Tomorrow => "Tomorrow".to_string(),
        DaySlot::Upcoming => day.date.format("%A").to_string(),
    }
}

fn draw_day<D>(target: &mut D, day: &DayPoint, area: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let small = FontSize::Small.line_height();
    let medium = FontSize::Medium.line_height();
    draw_text(
        target,
        &day_heading(day),
        FontSize::Medium,
        row(area, area.y, medium),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )?;

    let temps = if day.is_night_variant {
        format!("Low {}", day.low)
    } else {
        format!("{} / {}", day.high, day.low)
    };
    let summary = wrap(&day.summary, FontSize::Small.chars_for(area.width), DAY_SUMMARY_ROWS);
    let below = medium + small * summary.len() as u32 + 2;
    let icon_top = area.y + medium + 2;
    let icon_height = area.bottom().saturating_sub(icon_top + below);
    let icon = Rect::new(area.x, icon_top, area.width, icon_height).inset(2);
    draw_condition(target, day.condition, icon)?;

    let temp_top = area.bottom().saturating_sub(below);
    draw_text(
        target,
        &temps,
        FontSize::Medium,
        row(area, temp_top, medium),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )?;
    draw_lines(
        target,
        &summary,
        FontSize::Small,
        row(area, temp_top + medium + 2, small * summary.len() as u32),
        HAlign::Center,
    )?;
    Ok(())
}

fn alert_text(alert: &Alert, now: DateTime<Tz>) -> String {
    let when = |t: DateTime<Tz>| t.format("%a %-I:%M %P").to_string();
    match (alert.starts, alert.ends) {
        (Some(start), _) if start > now => {
            format!("{} beginning at {}", alert.headline, when(start))
        }
        (_, Some(end)) => format!("{} until {}", alert.headline, when(end)),
        _ => alert.headline.clone(),
    }
}

/// The first alert, inverted and centred; extra alerts are counted.
fn draw_alerts<D>(
    target: &mut D,
    alerts: &[Alert],
    area: Rect,
    now: DateTime<Tz>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let Some(first) = alerts.first() else {
        return Ok(());
    };
    let mut message = alert_text(first, now);
    if alerts.len() > 1 {
        message.push_str(&format!(" (+{} more)", alerts.len() - 1));
    }
    let size = FontSize::Medium;
    let line = fit_to_width(&message, size, area.width.saturating_sub(8));
    let width = (text_width(&line, size) + 8).min(area.width);
    let band = Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height);
    fill(target, band, BinaryColor::On)?;
    draw_text(target, &line, size, band, HAlign::Center, VAlign::Middle, BinaryColor::Off)
}

struct EventBlock {
    lines: Vec<String>,
}

fn event_block(event: &Event, chars: usize) -> EventBlock {
    let mut lines = wrap(&event.display_title(), chars, EVENT_TITLE_ROWS);
    lines.push(event.time_label());
    EventBlock { lines }
}

/// Events grouped by day with a weekday/date column. Entries that do not
/// fit are summarised by a `+N more` line.
fn draw_calendar<D>(target: &mut D, events: &[Event], area: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let small = FontSize::Small.line_height();
    if events.is_empty() {
        return draw_text(
            target,
            "No upcoming events",
            FontSize::Small,
            area,
            HAlign::Center,
            VAlign::Top,
            BinaryColor::On,
        );
    }
    let column = DATE_COLUMN.min(area.width / 3);
    let text_area_x = area.x + column + 2;
    let text_width_px = area.width.saturating_sub(column + 2);
    let chars = FontSize::Small.chars_for(text_width_px);
    let more_height = small;
    let bottom = area.bottom();

    let mut y = area.y;
    let mut current_day = None;
    for (index, event) in events.iter().enumerate() {
        let block = event_block(event, chars);
        let new_day = current_day != Some(event.date());
        let separator = if new_day && current_day.is_some() { 3 } else { 0 };
        let needed = separator + block.lines.len() as u32 * small + 2;
        let remaining_after = events.len() - index - 1;
        let limit = if remaining_after > 0 { bottom.saturating_sub(more_height) } else { bottom };
        if y + needed > limit {
            let more = format!("+{} more", events.len() - index);
            let more_y = bottom.saturating_sub(more_height);
            return draw_text(
                target,
                &more,
                FontSize::Small,
                Rect::new(area.x, more_y, area.width, more_height),
                HAlign::Right,
                VAlign::Top,
                BinaryColor::On,
            );
        }
        if new_day {
            if current_day.is_some() {
                Line::new(
                    Point::new(area.x as i32, (y + 1) as i32),
                    Point::new(area.right() as i32 - 1, (y + 1) as i32),
                )
                .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                .draw(target)?;
                y += separator;
            }
            let date_col = Rect::new(area.x, y, column, small);
            draw_text(
                target,
                &event.start.format("%a").to_string(),
                FontSize::Small,
                date_col,
                HAlign::Center,
                VAlign::Top,
                BinaryColor::On,
            )?;
            draw_text(
                target,
                &event.start.format("%-d").to_string(),
                FontSize::Bold,
                Rect::new(area.x, y + small, column, FontSize::Bold.line_height()),
                HAlign::Center,
                VAlign::Top,
                BinaryColor::On,
            )?;
            current_day = Some(event.date());
        }
        y = draw_lines(
            target,
            &block.lines,
            FontSize::Small,
            Rect::new(text_area_x, y, text_width_px, block.lines.len() as u32 * small),
            HAlign::Left,
        )? + 2;
    }
    Ok(())
}

fn draw_footer<D>(
    target: &mut D,
    provider: &str,
    updated_at: DateTime<Tz>,
    area: Rect,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let updated = format!(
        "Last updated on {} at {}",
        updated_at.format("%b %-d"),
        updated_at.format("%-I:%M %P")
    );
    let half = Rect::new(area.x, area.y, area.width / 2, area.height);
    draw_text(
        target,
        &updated,
        FontSize::Small,
        half,
        HAlign::Left,
        VAlign::Middle,
        BinaryColor::On,
    )?;
    let right = Rect::new(half.right(), area.y, area.width - half.width, area.height);
    draw_text(
        target,
        &format!("Powered by {provider}"),
        FontSize::Small,
        right,
        HAlign::Right,
        VAlign::Middle,
        BinaryColor::On,
    )
}

fn draw_placeholder<D>(target: &mut D, message: &str, area: Rect) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    outline(target, area.inset(1))?;
    let inner = area.inset(3);
    let chars = FontSize::Small.chars_for(inner.width);
    let rows = (inner.height / FontSize::Small.line_height()).max(1) as usize;
    let fits = message.split_whitespace().all(|w| w.chars().count() <= chars);
    let lines = if fits { wrap(message, chars, rows) } else { vec!["N/A".to_string()] };
    let height = lines.len() as u32 * FontSize::Small.line_height();
    let top = inner.y + inner.height.saturating_sub(height) / 2;
    let block = Rect::new(inner.x, top, inner.width, height.min(inner.height));
    draw_lines(target, &lines, FontSize::Small, block, HAlign::Center)?;
    Ok(())
}

/// Shown when nothing has ever rendered and both sources are down.
pub fn first_run_placeholder(canvas: CanvasSize, now: DateTime<Tz>) -> GrayImage {
    let mut surface = Canvas::new(canvas);
    if let Err(never) = draw_first_run(&mut surface, canvas, now) {
        match never {}
    }
    surface.into_image()
}

fn draw_first_run<D>(target: &mut D, canvas: CanvasSize, now: DateTime<Tz>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let area = Rect::new(0, 0, canvas.width, canvas.height);
    outline(target, area.inset(4))?;
    let middle = canvas.height / 2;
    let bold = FontSize::Bold.line_height();
    draw_text(
        target,
        "Weather and calendar unavailable",
        FontSize::Bold,
        row(area, middle.saturating_sub(bold), bold),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )?;
    let detail = format!("Will retry. Last attempt {}", now.format("%b %-d %-I:%M %P"));
    draw_text(
        target,
        &detail,
        FontSize::Small,
        row(area, middle + 4, FontSize::Small.line_height()),
        HAlign::Center,
        VAlign::Top,
        BinaryColor::On,
    )
}
