use std::path::Path;

use plotters::style::{Color, BLACK};

use super::palette::{self, BLUES, COMPETITOR, DARK, FOCUS, GAP, HEAT, MUTED, NEAR_TO_FAR, POSITIVE};
use super::primitives::{
    canvas, draw_heat, draw_layers, histogram, horizontal_bars, map_chart, text_panel, Bar, Guide, Histogram,
    Layer, Marker,
};
use super::Scene;
use crate::config::KM_PER_DEGREE;
use crate::error::ChartError;
use crate::proximity::{mean, median};

const DISTANCE_BINS: usize = 15;
const LISTED_GAPS: usize = 15;

fn focus_markers(scene: &Scene, marker: Marker, size: i32) -> Layer {
    Layer::uniform(scene.focus_points(), marker, size, FOCUS.filled()).labelled(scene.focus())
}

pub(super) fn density(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let density = &scene.analysis.density;
    let area = canvas(path, (1800, 700), "Competitive Density")?;
    let panels = area.split_evenly((1, 2));

    match &density.all_banks {
        Some(grid) => {
            let mut chart = map_chart(&panels[0], "Branch Density Heatmap - All Banks", scene.extent())?;
            draw_heat(&mut chart, &grid.lats, &grid.lons, &grid.values, &HEAT)?;
            draw_layers(
                &mut chart,
                &[Layer::uniform(
                    scene.dataset.branches().iter().map(|branch| branch.xy()),
                    Marker::Dot,
                    1,
                    BLACK.mix(0.4).filled(),
                )],
            )?;
        }
        None => text_panel(
            &panels[0],
            "Branch Density Heatmap - All Banks",
            &[String::from("Too few distinct locations for a density estimate")],
        )?,
    }

    let competitors = scene
        .dataset
        .excluding(scene.focus())
        .map(|branch| branch.xy())
        .collect::<Vec<_>>();
    let competitor_layer = match &density.at_competitors {
        Some(values) if values.len() == competitors.len() => {
            let max = values.iter().copied().fold(0.0, f64::max);
            let styled = competitors
                .iter()
                .zip(values)
                .map(|(point, value)| {
                    let color = palette::gradient(&BLUES, palette::ratio(*value, max));
                    (*point, color.mix(0.7).filled())
                })
                .collect();
            Layer::shaded(styled, Marker::Dot, 3)
        }
        _ => Layer::uniform(competitors, Marker::Dot, 3, COMPETITOR.mix(0.5).filled()),
    };
    let mut chart = map_chart(
        &panels[1],
        &format!("{} Locations vs Competitor Density", scene.focus()),
        scene.extent(),
    )?;
    draw_layers(
        &mut chart,
        &[
            competitor_layer.labelled("Competitors"),
            focus_markers(scene, Marker::Triangle, 7),
        ],
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn gaps(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let gaps = &scene.analysis.gaps;
    let area = canvas(path, (1800, 700), "Gap Analysis - Underserved Areas")?;
    let panels = area.split_evenly((1, 2));
    let farthest = gaps.first().map_or(0.0, |gap| gap.distance_deg);

    let shaded = gaps
        .iter()
        .map(|gap| {
            let color = palette::gradient(&NEAR_TO_FAR, palette::ratio(gap.distance_deg, farthest));
            ((gap.location.lon, gap.location.lat), color.filled())
        })
        .collect();
    let mut chart = map_chart(
        &panels[0],
        &format!("Competitor Locations Far from {}", scene.focus()),
        scene.extent(),
    )?;
    draw_layers(
        &mut chart,
        &[
            Layer::uniform(
                scene.dataset.branches().iter().map(|branch| branch.xy()),
                Marker::Dot,
                2,
                MUTED.mix(0.3).filled(),
            )
            .labelled("All branches"),
            Layer::shaded(shaded, Marker::Dot, 5).labelled("Gap opportunities"),
            focus_markers(scene, Marker::Square, 4),
        ],
    )?;

    let bars = gaps
        .iter()
        .take(LISTED_GAPS)
        .map(|gap| {
            Bar::new(
                format!("{} ({:.2}, {:.2})", gap.bank, gap.location.lat, gap.location.lon),
                gap.distance_km(),
                palette::gradient(&NEAR_TO_FAR, palette::ratio(gap.distance_deg, farthest)),
            )
        })
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[1],
        &format!("Top {LISTED_GAPS} Expansion Opportunities by Distance"),
        "Distance to nearest focus branch (km)",
        &bars,
        |bar| format!(" {:.0} km", bar.value),
    )?;
    area.present()?;
    Ok(())
}

fn mean_median_guides(values: &[f64], unit: impl Fn(f64) -> String) -> Vec<Guide> {
    if values.is_empty() {
        return Vec::new();
    }
    let (mean, median) = (mean(values), median(values));
    vec![
        Guide {
            label: format!("Mean: {}", unit(mean)),
            value: mean,
            color: FOCUS,
        },
        Guide {
            label: format!("Median: {}", unit(median)),
            value: median,
            color: POSITIVE,
        },
    ]
}

pub(super) fn nearest(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let nearest = &scene.analysis.nearest;
    let area = canvas(path, (1800, 700), "Nearest Competitor Analysis")?;
    let panels = area.split_evenly((1, 2));

    let distances = nearest.distances();
    histogram(
        &panels[0],
        &format!("{}: Distance to Nearest Competitor", scene.focus()),
        "Distance (degrees)",
        "Number of branches",
        &Histogram::of(&distances, DISTANCE_BINS),
        &NEAR_TO_FAR,
        &mean_median_guides(&distances, |v| format!("{v:.4}° (~{:.1} km)", v * KM_PER_DEGREE)),
    )?;

    let bars = nearest
        .by_bank
        .iter()
        .map(|entry| Bar::new(entry.bank.as_str(), entry.count as f64, scene.bank_color(&entry.bank)))
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[1],
        "Most Frequent Direct Competitors",
        "Times nearest to a focus branch",
        &bars,
        |bar| format!(" {:.0}", bar.value),
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn intensity(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let report = &scene.analysis.intensity;
    let area = canvas(path, (1800, 700), "Competitive Intensity")?;
    let panels = area.split_evenly((1, 2));

    let bars = report
        .banks
        .iter()
        .map(|entry| {
            let color = if entry.bank == scene.focus() { FOCUS } else { COMPETITOR };
            Bar::new(entry.bank.as_str(), entry.average, color)
        })
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[0],
        "Average Competitive Intensity by Bank",
        "Average branches within 0.1°",
        &bars,
        |bar| format!(" {:.1}", bar.value),
    )?;

    let counts = report
        .counts_for(scene.dataset, scene.focus())
        .map(|count| count as f64)
        .collect::<Vec<_>>();
    histogram(
        &panels[1],
        &format!("{}: Competitive Intensity Distribution", scene.focus()),
        "Branches within 0.1°",
        "Number of branches",
        &Histogram::of(&counts, DISTANCE_BINS),
        &[POSITIVE, GAP, FOCUS],
        &mean_median_guides(&counts, |v| format!("{v:.1} competitors")),
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn opportunities(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let grid = &scene.analysis.opportunities;
    let top = &scene.analysis.top_opportunities;
    let area = canvas(path, (1800, 700), "Growth Opportunity Score")?;
    let panels = area.split_evenly((1, 2));

    let scores = grid.cells.iter().map(|cell| cell.score).collect::<Vec<_>>();
    let mut chart = map_chart(
        &panels[0],
        &format!("Expansion Opportunity Heatmap for {}", scene.focus()),
        scene.extent(),
    )?;
    draw_heat(&mut chart, &grid.lats, &grid.lons, &scores, &HEAT)?;
    draw_layers(
        &mut chart,
        &[
            focus_markers(scene, Marker::Square, 4),
            Layer::uniform(
                top.iter().map(|cell| (cell.location.lon, cell.location.lat)),
                Marker::Triangle,
                7,
                DARK.filled(),
            )
            .labelled(format!("Top {} locations", top.len())),
        ],
    )?;

    let best = grid.max_score();
    let bars = top
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            Bar::new(
                format!("#{} ({:.2}, {:.2})", i + 1, cell.location.lat, cell.location.lon),
                cell.score,
                palette::gradient(&HEAT, palette::ratio(cell.score, best)),
            )
        })
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[1],
        &format!("Top {} Recommended Expansion Locations", top.len()),
        "Opportunity score",
        &bars,
        |bar| format!(" {:.2}", bar.value),
    )?;
    area.present()?;
    Ok(())
}
