//! PNG charts rendered with plotters.
//!
//! Data preparation is kept separate from drawing: the `*_lines` functions
//! turn price and correlation series into plain `(date, value)` lines, and
//! [`ChartRenderer`] only draws what it is given.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use sectorlens_data::PriceSeries;
use sectorlens_risk::returns::{cumulative_returns, padded_returns};
use sectorlens_risk::{CorrelationMatrix, RollingCorrelationSeries};
use std::error::Error;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while rendering a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// No finite data points to draw.
    #[error("Nothing to plot for {0}")]
    Empty(String),

    /// The drawing backend failed.
    #[error("Render error: {0}")]
    Render(String),
}

/// One labelled curve.
#[derive(Debug, Clone, PartialEq)]
pub struct LineData {
    /// Legend label.
    pub label: String,
    /// Points in date order.
    pub points: Vec<(NaiveDate, f64)>,
}

/// Cumulative return of each series over its whole history.
pub fn cumulative_return_lines(series: &[PriceSeries]) -> Vec<LineData> {
    series
        .iter()
        .filter(|s| s.len() >= 2)
        .map(|s| LineData {
            label: s.symbol().to_string(),
            points: s
                .dates()
                .into_iter()
                .zip(cumulative_returns(&padded_returns(&s.closes())))
                .collect(),
        })
        .collect()
}

/// Cumulative return of each series minus the benchmark's, both measured
/// from the first date they have in common.
pub fn relative_performance_lines(series: &[PriceSeries], benchmark: &PriceSeries) -> Vec<LineData> {
    series
        .iter()
        .filter(|s| s.symbol() != benchmark.symbol())
        .filter_map(|s| {
            let common: Vec<(NaiveDate, f64, f64)> = s
                .points()
                .iter()
                .filter_map(|p| benchmark.close_on(p.date).map(|b| (p.date, p.close, b)))
                .collect();
            if common.len() < 2 {
                return None;
            }

            let prices: Vec<f64> = common.iter().map(|c| c.1).collect();
            let bench: Vec<f64> = common.iter().map(|c| c.2).collect();
            let own = cumulative_returns(&padded_returns(&prices));
            let base = cumulative_returns(&padded_returns(&bench));

            Some(LineData {
                label: s.symbol().to_string(),
                points: common
                    .iter()
                    .zip(own.iter().zip(&base))
                    .map(|(c, (a, b))| (c.0, a - b))
                    .collect(),
            })
        })
        .collect()
}

/// Rolling correlation curves, undefined windows dropped.
pub fn rolling_correlation_lines(series: &[RollingCorrelationSeries]) -> Vec<LineData> {
    series
        .iter()
        .map(|s| LineData {
            label: s.symbol.clone(),
            points: s
                .points
                .iter()
                .filter(|p| p.value.is_finite())
                .map(|p| (p.date, p.value))
                .collect(),
        })
        .filter(|line| !line.points.is_empty())
        .collect()
}

/// Blue for -1, white for 0, red for +1, grey when undefined.
pub fn diverging_color(value: f64) -> RGBColor {
    if !value.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let t = value.clamp(-1.0, 1.0);
    let blend = |from: u8, to: u8, s: f64| (f64::from(from) + (f64::from(to) - f64::from(from)) * s) as u8;
    if t < 0.0 {
        let s = -t;
        RGBColor(blend(255, 59, s), blend(255, 76, s), blend(255, 192, s))
    } else {
        RGBColor(blend(255, 180, t), blend(255, 4, t), blend(255, 38, t))
    }
}

struct Bounds {
    origin: NaiveDate,
    span: i32,
    y_min: f64,
    y_max: f64,
}

fn bounds(lines: &[LineData]) -> Option<Bounds> {
    let finite = || {
        lines
            .iter()
            .flat_map(|l| l.points.iter())
            .filter(|(_, v)| v.is_finite())
    };
    let origin = finite().map(|(d, _)| *d).min()?;
    let last = finite().map(|(d, _)| *d).max()?;
    let y_min = finite().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let y_max = finite().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

    let pad = ((y_max - y_min) * 0.05).max(0.01);
    Some(Bounds {
        origin,
        span: i32::try_from((last - origin).num_days()).unwrap_or(i32::MAX).max(1),
        y_min: y_min - pad,
        y_max: y_max + pad,
    })
}

/// Draws charts of a fixed pixel size.
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl ChartRenderer {
    /// Create a renderer producing `width` x `height` images.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Line chart with one curve per [`LineData`] against a date axis.
    pub fn line_chart(
        &self,
        path: &Path,
        title: &str,
        y_desc: &str,
        lines: &[LineData],
    ) -> Result<(), ChartError> {
        let bounds = bounds(lines).ok_or_else(|| ChartError::Empty(title.to_string()))?;
        self.draw_lines(path, title, y_desc, lines, &bounds)
            .map_err(|e| ChartError::Render(e.to_string()))
    }

    /// Annotated correlation heatmap.
    pub fn heatmap(&self, path: &Path, title: &str, matrix: &CorrelationMatrix) -> Result<(), ChartError> {
        if matrix.is_empty() {
            return Err(ChartError::Empty(title.to_string()));
        }
        self.draw_heatmap(path, title, matrix)
            .map_err(|e| ChartError::Render(e.to_string()))
    }

    fn draw_lines(
        &self,
        path: &Path,
        title: &str,
        y_desc: &str,
        lines: &[LineData],
        bounds: &Bounds,
    ) -> Result<(), Box<dyn Error>> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0i32..bounds.span, bounds.y_min..bounds.y_max)?;

        let origin = bounds.origin;
        let date_label = |x: &i32| {
            (origin + Duration::days(i64::from(*x)))
                .format("%Y-%m")
                .to_string()
        };
        chart
            .configure_mesh()
            .x_labels(10)
            .x_label_formatter(&date_label)
            .y_desc(y_desc)
            .draw()?;

        for (i, line) in lines.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            let points = line
                .points
                .iter()
                .filter(|(_, v)| v.is_finite())
                .map(|(d, v)| ((*d - origin).num_days() as i32, *v));
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_heatmap(&self, path: &Path, title: &str, matrix: &CorrelationMatrix) -> Result<(), Box<dyn Error>> {
        let n = i32::try_from(matrix.len())?;
        let symbols = matrix.symbols();
        let values = matrix.values();

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(16)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

        // rows are drawn top-down, so y segment k holds matrix row n - 1 - k
        let column_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(j) => symbols.get(*j as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        let row_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(k) => symbols
                .get((n - 1 - *k) as usize)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(symbols.len())
            .y_labels(symbols.len())
            .x_label_formatter(&column_label)
            .y_label_formatter(&row_label)
            .draw()?;

        let cells = || (0..n).flat_map(move |i| (0..n).map(move |j| (i, j, values[[i as usize, j as usize]])));

        chart.draw_series(cells().map(|(i, j, value)| {
            let k = n - 1 - i;
            Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(k)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(k + 1)),
                ],
                diverging_color(value).filled(),
            )
        }))?;

        let style = ("sans-serif", 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells().map(|(i, j, value)| {
            let text = if value.is_finite() {
                format!("{value:.2}")
            } else {
                "NaN".to_string()
            };
            Text::new(
                text,
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(n - 1 - i)),
                style.clone(),
            )
        }))?;

        root.present()?;
        Ok(())
    }
}
