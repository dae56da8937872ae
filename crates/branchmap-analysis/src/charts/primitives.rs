//! Panel builders shared by the chart files: bar panels, map scatters,
//! heat grids, histograms and text panels on an SVG canvas.

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::palette;
use crate::dataset::Bounds;
use crate::error::ChartError;

pub type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
/// The chart and its backend share one lifetime; series labels need the
/// backend to outlive the chart context.
pub type MapChart<'a> = ChartContext<'a, SVGBackend<'a>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

pub const FONT: &str = "sans-serif";

/// White canvas with a title strip; the returned area is below the title.
pub fn canvas<'a>(path: &'a Path, size: (u32, u32), title: &str) -> Result<Area<'a>, ChartError> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    Ok(root.titled(title, (FONT, 26))?)
}

pub fn text_panel(area: &Area, title: &str, lines: &[String]) -> Result<(), ChartError> {
    let body = area.titled(title, (FONT, 16))?;
    for (i, line) in lines.iter().enumerate() {
        body.draw(&Text::new(
            line.as_str(),
            (16, 12 + i as i32 * 20),
            ("monospace", 13).into_font(),
        ))?;
    }
    Ok(())
}

fn no_data(area: &Area, title: &str) -> Result<(), ChartError> {
    text_panel(area, title, &[String::from("No data")])
}

// =============================================================================
// Bars
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            value,
            color,
        }
    }
}

fn headroom(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.2
    } else {
        1.0
    }
}

/// Label of segment `row`, where row 0 is the bottom bar.
fn row_label(bars: &[Bar], row: i32) -> String {
    usize::try_from(row)
        .ok()
        .and_then(|row| bars.len().checked_sub(row + 1))
        .and_then(|index| bars.get(index))
        .map(|bar| bar.label.clone())
        .unwrap_or_default()
}

/// Horizontal bars, first bar on top, each annotated at its end.
pub fn horizontal_bars(
    area: &Area,
    title: &str,
    x_desc: &str,
    bars: &[Bar],
    annotate: impl Fn(&Bar) -> String,
) -> Result<(), ChartError> {
    if bars.is_empty() {
        return no_data(area, title);
    }
    let n = bars.len() as i32;
    let x_max = headroom(bars.iter().map(|bar| bar.value).fold(0.0, f64::max));
    let widest = bars.iter().map(|bar| bar.label.chars().count()).max().unwrap_or(0) as u32;

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 16))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size((widest * 7 + 16).min(240))
        .build_cartesian_2d(0.0..x_max, (0..n).into_segmented())?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(x_desc)
        .y_labels(bars.len())
        .y_label_formatter(&|value| match value {
            SegmentValue::CenterOf(row) => row_label(bars, *row),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let row = n - 1 - i as i32;
        let mut rect = Rectangle::new(
            [(0.0, SegmentValue::Exact(row)), (bar.value, SegmentValue::Exact(row + 1))],
            bar.color.filled(),
        );
        rect.set_margin(3, 3, 0, 0);
        rect
    }))?;
    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let row = n - 1 - i as i32;
        Text::new(
            annotate(bar),
            (bar.value, SegmentValue::CenterOf(row)),
            (FONT, 11).into_font(),
        )
    }))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

impl BarSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>, color: RGBColor) -> Self {
        Self {
            name: name.into(),
            values,
            color,
        }
    }
}

/// Vertical bars, one cluster per group with one bar per series.
pub fn grouped_bars(
    area: &Area,
    title: &str,
    y_desc: &str,
    groups: &[String],
    series: &[BarSeries],
) -> Result<(), ChartError> {
    if groups.is_empty() || series.is_empty() {
        return no_data(area, title);
    }
    let width = series.len() as i32;
    let stride = width + 1;
    let span = stride * groups.len() as i32;
    let y_max = headroom(
        series
            .iter()
            .flat_map(|entry| entry.values.iter().copied())
            .fold(0.0, f64::max),
    );

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 16))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(48)
        .build_cartesian_2d(0..span, 0.0..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(y_desc)
        .x_labels(span as usize + 1)
        .x_label_formatter(&|x| {
            if x.rem_euclid(stride) == width / 2 {
                groups
                    .get((x / stride) as usize)
                    .cloned()
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .draw()?;

    for (offset, entry) in series.iter().enumerate() {
        let color = entry.color;
        let left = |group: usize| stride * group as i32 + offset as i32;
        let annotation = chart.draw_series(entry.values.iter().enumerate().map(|(group, value)| {
            let mut rect = Rectangle::new([(left(group), 0.0), (left(group) + 1, *value)], color.filled());
            rect.set_margin(0, 0, 2, 2);
            rect
        }))?;
        annotation
            .label(entry.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        chart.draw_series(entry.values.iter().enumerate().map(|(group, value)| {
            Text::new(
                format!("{value:.1}"),
                (left(group), *value),
                (FONT, 10).into_font(),
            )
        }))?;
    }
    if series.len() > 1 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

// =============================================================================
// Maps
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Dot,
    Square,
    Triangle,
    Cross,
}

/// One scatter series in `(lon, lat)` space.
#[derive(Debug, Clone)]
pub struct Layer {
    pub points: Vec<((f64, f64), ShapeStyle)>,
    pub marker: Marker,
    pub size: i32,
    pub legend_style: ShapeStyle,
    pub label: Option<String>,
}

impl Layer {
    pub fn uniform(points: impl IntoIterator<Item = (f64, f64)>, marker: Marker, size: i32, style: ShapeStyle) -> Self {
        Self {
            points: points.into_iter().map(|point| (point, style)).collect(),
            marker,
            size,
            legend_style: style,
            label: None,
        }
    }

    /// Per-point styles, e.g. a colour scale.
    pub fn shaded(points: Vec<((f64, f64), ShapeStyle)>, marker: Marker, size: i32) -> Self {
        let legend_style = points
            .first()
            .map_or_else(|| palette::MUTED.filled(), |(_, style)| *style);
        Self {
            points,
            marker,
            size,
            legend_style,
            label: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Widens degenerate ranges so a single point still gets an axis.
pub fn map_extent(bounds: Bounds, padding: f64) -> Bounds {
    let mut extent = bounds.padded(padding);
    if extent.max_lat - extent.min_lat <= f64::EPSILON {
        extent.min_lat -= 0.5;
        extent.max_lat += 0.5;
    }
    if extent.max_lon - extent.min_lon <= f64::EPSILON {
        extent.min_lon -= 0.5;
        extent.max_lon += 0.5;
    }
    extent
}

pub fn map_chart<'a>(area: &Area<'a>, title: &str, extent: Bounds) -> Result<MapChart<'a>, ChartError> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 16))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(extent.min_lon..extent.max_lon, extent.min_lat..extent.max_lat)?;
    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_label_formatter(&|v| format!("{v:.1}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;
    Ok(chart)
}

pub fn draw_layers<'a>(chart: &mut MapChart<'a>, layers: &[Layer]) -> Result<(), ChartError> {
    let mut labelled = false;
    for layer in layers {
        let size = layer.size;
        let points = layer.points.iter().copied();
        let annotation = match layer.marker {
            Marker::Dot => chart.draw_series(points.map(|(at, style)| Circle::new(at, size, style)))?,
            Marker::Square => chart.draw_series(points.map(|(at, style)| {
                EmptyElement::at(at) + Rectangle::new([(-size, -size), (size, size)], style)
            }))?,
            Marker::Triangle => {
                chart.draw_series(points.map(|(at, style)| TriangleMarker::new(at, size, style)))?
            }
            Marker::Cross => chart.draw_series(points.map(|(at, style)| Cross::new(at, size, style)))?,
        };
        if let Some(label) = &layer.label {
            let legend = layer.legend_style;
            annotation
                .label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], legend));
            labelled = true;
        }
    }
    if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font((FONT, 11))
            .draw()?;
    }
    Ok(())
}

/// Fills each lattice cell with the colour of its value relative to the maximum.
pub fn draw_heat<'a>(
    chart: &mut MapChart<'a>,
    lats: &[f64],
    lons: &[f64],
    values: &[f64],
    stops: &[RGBColor],
) -> Result<(), ChartError> {
    let (Some(half_lat), Some(half_lon)) = (half_step(lats), half_step(lons)) else {
        return Ok(());
    };
    let max = values.iter().copied().fold(0.0, f64::max);
    let cells = lats.iter().enumerate().flat_map(|(row, &lat)| {
        lons.iter()
            .enumerate()
            .map(move |(column, &lon)| (row * lons.len() + column, lat, lon))
    });
    chart.draw_series(cells.filter_map(|(index, lat, lon)| {
        values.get(index).map(|value| {
            Rectangle::new(
                [(lon - half_lon, lat - half_lat), (lon + half_lon, lat + half_lat)],
                palette::gradient(stops, palette::ratio(*value, max)).filled(),
            )
        })
    }))?;
    Ok(())
}

fn half_step(axis: &[f64]) -> Option<f64> {
    match axis {
        [] => None,
        [_] => Some(0.05),
        [first, second, ..] => Some((second - first).abs() / 2.0),
    }
}

// =============================================================================
// Histograms
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Equal-width bins over the value range; the last bin includes its
    /// upper edge. A constant sample is centred in a unit-wide range.
    pub fn of(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut low, mut high) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), v| (low.min(*v), high.max(*v)));
        if values.is_empty() {
            (low, high) = (0.0, 1.0);
        } else if low == high {
            (low, high) = (low - 0.5, high + 0.5);
        }
        let width = (high - low) / bins as f64;
        let edges = (0..=bins).map(|i| low + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for value in values {
            let index = (((value - low) / width).floor() as usize).min(bins - 1);
            counts[index] += 1;
        }
        Self { edges, counts }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

/// Bars coloured along `stops` from the first bin to the last, with
/// optional vertical guides such as mean and median.
pub fn histogram(
    area: &Area,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    histogram: &Histogram,
    stops: &[RGBColor],
    guides: &[Guide],
) -> Result<(), ChartError> {
    let (Some(&low), Some(&high)) = (histogram.edges.first(), histogram.edges.last()) else {
        return no_data(area, title);
    };
    let y_max = headroom(histogram.max_count() as f64);
    let bins = histogram.counts.len();

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 16))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(low..high, 0.0..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&|v| format!("{v:.2}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(histogram.counts.iter().enumerate().map(|(i, count)| {
        let t = if bins > 1 { i as f64 / (bins - 1) as f64 } else { 0.0 };
        let mut rect = Rectangle::new(
            [(histogram.edges[i], 0.0), (histogram.edges[i + 1], *count as f64)],
            palette::gradient(stops, t).filled(),
        );
        rect.set_margin(0, 0, 1, 1);
        rect
    }))?;
    for guide in guides {
        let style = guide.color.stroke_width(3);
        chart
            .draw_series(LineSeries::new(vec![(guide.value, 0.0), (guide.value, y_max)], style))?
            .label(guide.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], style));
    }
    if !guides.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn histogram_last_bin_includes_upper_edge() {
        let hist = Histogram::of(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);

        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
    }

    #[test]
    fn constant_sample_is_centred() {
        let hist = Histogram::of(&[2.0, 2.0], 2);

        assert_eq!(hist.edges, vec![1.5, 2.0, 2.5]);
        assert_eq!(hist.counts, vec![0, 2]);
        assert_eq!(hist.max_count(), 2);
    }

    #[test]
    fn row_labels_count_from_the_bottom() {
        let bars = vec![
            Bar::new("top", 3.0, palette::FOCUS),
            Bar::new("bottom", 1.0, palette::MUTED),
        ];

        assert_eq!(row_label(&bars, 0), "bottom");
        assert_eq!(row_label(&bars, 1), "top");
        assert_eq!(row_label(&bars, 2), "");
        assert_eq!(row_label(&bars, -1), "");
    }

    #[test]
    fn degenerate_extent_is_widened() {
        let point = Bounds {
            min_lat: 40.0,
            max_lat: 40.0,
            min_lon: 49.0,
            max_lon: 49.0,
        };

        let extent = map_extent(point, 0.0);

        assert_eq!((extent.min_lat, extent.max_lat), (39.5, 40.5));
        assert_eq!((extent.min_lon, extent.max_lon), (48.5, 49.5));
    }

    #[test]
    fn labelled_layers_over_a_heat_grid_render_to_svg() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("map.svg");
        let extent = map_extent(
            Bounds {
                min_lat: 40.35,
                max_lat: 40.45,
                min_lon: 49.75,
                max_lon: 49.85,
            },
            0.02,
        );

        {
            let area = canvas(&path, (640, 480), "Branch Map").expect("canvas");
            let mut chart = map_chart(&area, "Baku", extent).expect("map chart");
            draw_heat(
                &mut chart,
                &[40.37, 40.43],
                &[49.77, 49.83],
                &[1.0, 2.0, 3.0, 4.0],
                &palette::HEAT,
            )
            .expect("heat grid");
            draw_layers(
                &mut chart,
                &[
                    Layer::uniform([(49.80, 40.40)], Marker::Dot, 5, palette::FOCUS.filled())
                        .labelled("Bank of Baku"),
                    Layer::uniform([(49.78, 40.38)], Marker::Cross, 4, palette::COMPETITOR.filled())
                        .labelled("Competitors"),
                ],
            )
            .expect("layers");
            area.present().expect("svg flushed");
        }

        let svg = fs::read_to_string(&path).expect("svg written");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Bank of Baku"));
        assert!(svg.contains("Competitors"));
    }
}
