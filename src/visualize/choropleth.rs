//! Log-scaled choropleth world maps (SVG)
//!
//! Uses the SVG backend to avoid system font dependencies.

use super::geo::CountryShape;
use crate::error::{PipelineError, Result};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

const NO_DATA: RGBColor = RGBColor(211, 211, 211);

/// ColorBrewer OrRd, 9 classes
const OR_RD: [RGBColor; 9] = [
    RGBColor(255, 247, 236),
    RGBColor(254, 232, 200),
    RGBColor(253, 212, 158),
    RGBColor(253, 187, 132),
    RGBColor(252, 141, 89),
    RGBColor(239, 101, 72),
    RGBColor(215, 48, 31),
    RGBColor(179, 0, 0),
    RGBColor(127, 0, 0),
];

/// Title, colorbar label and tick style of one map
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub title: String,
    pub legend: String,
    pub percent: bool,
}

/// Logarithmic normalization between the smallest positive and the largest value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNorm {
    pub vmin: f64,
    pub vmax: f64,
}

impl LogNorm {
    /// `None` when no value is positive
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<Self> {
        let positive: Vec<f64> = values.into_iter().copied().filter(|v| *v > 0.0 && v.is_finite()).collect();
        let vmin = positive.iter().copied().fold(f64::INFINITY, f64::min);
        let vmax = positive.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (!positive.is_empty()).then_some(LogNorm { vmin, vmax })
    }

    /// Position of `value` on the scale, clamped to [0, 1]
    pub fn normalize(&self, value: f64) -> f64 {
        if value <= self.vmin {
            return 0.0;
        }
        if self.vmax <= self.vmin {
            return 1.0;
        }
        ((value.ln() - self.vmin.ln()) / (self.vmax.ln() - self.vmin.ln())).clamp(0.0, 1.0)
    }
}

/// Color of position `t` in [0, 1] on the OrRd ramp
pub fn ramp_color(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (OR_RD.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(OR_RD.len() - 2);
    let frac = scaled - idx as f64;
    let (a, b) = (OR_RD[idx], OR_RD[idx + 1]);
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn render_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Render(e.to_string())
}

fn tick_label(value: f64, percent: bool) -> String {
    let text = if value != 0.0 && (value.abs() < 1e-3 || value.abs() >= 1e6) {
        format!("{:.2e}", value)
    } else {
        let fixed = format!("{:.4}", value);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    if percent {
        format!("{}%", text)
    } else {
        text
    }
}

/// Draw `values` (keyed by ISO-3) over `shapes` and write an SVG to `path`
pub fn render_choropleth(
    path: &Path,
    shapes: &[CountryShape],
    values: &BTreeMap<String, f64>,
    style: &MapStyle,
) -> Result<()> {
    let root = SVGBackend::new(path, (1600, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let (map_area, bar_area) = root.split_horizontally(1440);

    let norm = LogNorm::from_values(values.values());

    let mut chart = ChartBuilder::on(&map_area)
        .caption(&style.title, ("sans-serif", 24))
        .margin(10)
        .build_cartesian_2d(-180f64..180f64, -90f64..90f64)
        .map_err(render_err)?;

    let fill_for = |iso3: &Option<String>| -> RGBColor {
        let value = iso3.as_ref().and_then(|code| values.get(code));
        match (value, norm) {
            (Some(v), Some(norm)) if v.is_finite() => ramp_color(norm.normalize(*v)),
            _ => NO_DATA,
        }
    };

    chart
        .draw_series(shapes.iter().flat_map(|shape| {
            let color = fill_for(&shape.iso3);
            shape.rings.iter().map(move |ring| Polygon::new(ring.clone(), color.filled()))
        }))
        .map_err(render_err)?;

    chart
        .draw_series(shapes.iter().flat_map(|shape| {
            shape
                .rings
                .iter()
                .map(|ring| PathElement::new(ring.clone(), WHITE.stroke_width(1)))
        }))
        .map_err(render_err)?;

    draw_colorbar(&bar_area, norm, style)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    norm: Option<LogNorm>,
    style: &MapStyle,
) -> Result<()> {
    let (width, height) = area.dim_in_pixel();
    let top = (height as i32) / 5;
    let bottom = (height as i32) * 4 / 5;
    let left = 20;
    let right = left + 24_i32.min(width as i32 / 4);
    let label_font = ("sans-serif", 14).into_font().color(&BLACK);

    area.draw(&Text::new(style.legend.clone(), (left, top - 30), label_font.clone()))
        .map_err(render_err)?;

    let norm = match norm {
        Some(norm) => norm,
        None => {
            area.draw(&Text::new("No data", (left, top), label_font))
                .map_err(render_err)?;
            return Ok(());
        }
    };

    let steps = 100;
    let span = (bottom - top).max(1);
    for step in 0..steps {
        let y0 = bottom - span * step / steps;
        let y1 = bottom - span * (step + 1) / steps;
        let color = ramp_color(f64::from(step) / f64::from(steps - 1));
        area.draw(&Rectangle::new([(left, y1), (right, y0)], color.filled()))
            .map_err(render_err)?;
    }

    area.draw(&Text::new(tick_label(norm.vmax, style.percent), (right + 6, top - 7), label_font.clone()))
        .map_err(render_err)?;
    area.draw(&Text::new(tick_label(norm.vmin, style.percent), (right + 6, bottom - 7), label_font))
        .map_err(render_err)?;
    Ok(())
}
