use std::collections::BTreeMap;
use std::path::Path;

use plotters::style::{Color, BLACK};

use super::palette::{self, COMPETITOR, DARK, FOCUS, MUTED};
use super::primitives::{
    canvas, draw_layers, grouped_bars, horizontal_bars, map_chart, map_extent, Bar, BarSeries, Layer, Marker,
};
use super::{short, Scene};
use crate::dataset::Bounds;
use crate::error::ChartError;
use crate::market::bank_counts;
use crate::regions::{in_baku, Zone};

const BAKU_BOX: Bounds = Bounds {
    min_lat: 40.3,
    max_lat: 40.5,
    min_lon: 49.7,
    max_lon: 50.0,
};

fn focus_layer(scene: &Scene, size: i32) -> Layer {
    Layer::uniform(scene.focus_points(), Marker::Square, size, FOCUS.filled()).labelled(scene.focus())
}

fn backdrop(scene: &Scene) -> Layer {
    Layer::uniform(
        scene.dataset.branches().iter().map(|branch| branch.xy()),
        Marker::Dot,
        2,
        MUTED.mix(0.3).filled(),
    )
}

pub(super) fn all_branches(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let area = canvas(
        path,
        (1600, 1100),
        &format!(
            "Geographic Distribution of Bank Branches ({} highlighted as squares)",
            scene.focus()
        ),
    )?;
    let mut chart = map_chart(&area, "", scene.extent())?;

    let mut layers = scene
        .analysis
        .market
        .counts
        .iter()
        .filter(|count| count.bank != scene.focus())
        .map(|count| {
            Layer::uniform(
                scene.dataset.of_bank(&count.bank).map(|branch| branch.xy()),
                Marker::Dot,
                3,
                scene.bank_color(&count.bank).mix(0.7).filled(),
            )
            .labelled(count.bank.as_str())
        })
        .collect::<Vec<_>>();
    layers.push(focus_layer(scene, 5));
    draw_layers(&mut chart, &layers)?;
    area.present()?;
    Ok(())
}

pub(super) fn focus_vs_competitors(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let area = canvas(
        path,
        (1400, 1200),
        &format!("Geographic Coverage Comparison: {} vs Top Competitors", scene.focus()),
    )?;
    let panels = area.split_evenly((2, 2));
    let banks = std::iter::once(scene.focus()).chain(
        scene
            .analysis
            .market
            .counts
            .iter()
            .filter(|count| count.bank != scene.focus())
            .take(3)
            .map(|count| count.bank.as_str()),
    );

    for (panel, bank) in panels.iter().zip(banks) {
        let points = scene.dataset.of_bank(bank).map(|branch| branch.xy()).collect::<Vec<_>>();
        let title = format!("{bank} - {} branches", points.len());
        let mut chart = map_chart(panel, &title, scene.extent())?;
        let highlight = if bank == scene.focus() {
            Layer::uniform(points, Marker::Square, 4, FOCUS.filled())
        } else {
            Layer::uniform(points, Marker::Dot, 4, scene.bank_color(bank).filled())
        };
        draw_layers(
            &mut chart,
            &[backdrop(scene).labelled("Other banks"), highlight.labelled(bank)],
        )?;
    }
    area.present()?;
    Ok(())
}

pub(super) fn clusters(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let summary = &scene.analysis.clusters;
    let area = canvas(path, (1800, 700), "Regional Clustering (DBSCAN)")?;
    let panels = area.split_evenly((1, 2));

    let mut members: BTreeMap<usize, Vec<(f64, f64)>> = BTreeMap::new();
    let mut noise = Vec::new();
    for (branch, label) in scene.dataset.branches().iter().zip(&summary.labels) {
        match label {
            Some(id) => members.entry(*id).or_default().push(branch.xy()),
            None => noise.push(branch.xy()),
        }
    }
    let mut layers = vec![Layer::uniform(noise, Marker::Dot, 2, MUTED.mix(0.5).filled()).labelled("Noise")];
    layers.extend(members.into_iter().map(|(id, points)| {
        Layer::uniform(points, Marker::Dot, 3, palette::categorical(id).mix(0.8).filled())
            .labelled(format!("Cluster {id}"))
    }));
    layers.push(
        Layer::uniform(
            summary
                .clusters
                .iter()
                .map(|cluster| (cluster.centroid.lon, cluster.centroid.lat)),
            Marker::Cross,
            8,
            BLACK.stroke_width(2),
        )
        .labelled("Centroid"),
    );
    let mut chart = map_chart(&panels[0], "Regional Clusters - All Banks", scene.extent())?;
    draw_layers(&mut chart, &layers)?;

    let groups = summary
        .clusters
        .iter()
        .map(|cluster| format!("C{}", cluster.id))
        .collect::<Vec<_>>();
    grouped_bars(
        &panels[1],
        &format!("{} Presence by Regional Cluster", scene.focus()),
        "Number of branches",
        &groups,
        &[
            BarSeries::new(
                "All banks",
                summary.clusters.iter().map(|cluster| cluster.size as f64).collect(),
                COMPETITOR,
            ),
            BarSeries::new(
                scene.focus(),
                summary
                    .clusters
                    .iter()
                    .map(|cluster| cluster.focus_branches as f64)
                    .collect(),
                FOCUS,
            ),
        ],
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn baku_city(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let area = canvas(path, (1800, 700), "Baku City Analysis")?;
    let panels = area.split_evenly((1, 2));
    let city = scene.dataset.filtered(|branch| in_baku(&branch.location));

    let competitors = city
        .excluding(scene.focus())
        .map(|branch| branch.xy())
        .collect::<Vec<_>>();
    let focus = city.of_bank(scene.focus()).map(|branch| branch.xy()).collect::<Vec<_>>();
    let mut chart = map_chart(
        &panels[0],
        &format!("Baku City - Branch Distribution ({} as squares)", scene.focus()),
        map_extent(BAKU_BOX, 0.01),
    )?;
    draw_layers(
        &mut chart,
        &[
            Layer::uniform(competitors, Marker::Dot, 3, COMPETITOR.mix(0.6).filled()).labelled("Competitors"),
            Layer::uniform(focus, Marker::Square, 5, FOCUS.filled()).labelled(scene.focus()),
        ],
    )?;

    let bars = bank_counts(city.branches())
        .into_iter()
        .take(15)
        .map(|count| {
            let color = if count.bank == scene.focus() { FOCUS } else { DARK };
            Bar::new(count.bank, count.branches as f64, color)
        })
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[1],
        "Baku City - Branch Count by Bank",
        "Number of branches",
        &bars,
        |bar| format!(" {:.0}", bar.value),
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn zones(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let area = canvas(path, (1800, 800), "Regional Market Dominance")?;
    let panels = area.split_evenly((1, 2));

    let mut by_zone: BTreeMap<usize, Vec<(f64, f64)>> = BTreeMap::new();
    for branch in scene.dataset.branches() {
        let zone = Zone::of(&branch.location);
        let order = Zone::NAMED
            .iter()
            .position(|named| *named == zone)
            .unwrap_or(Zone::NAMED.len());
        by_zone.entry(order).or_default().push(branch.xy());
    }
    let mut layers = by_zone
        .into_iter()
        .map(|(order, points)| {
            let zone = Zone::NAMED.get(order).copied().unwrap_or(Zone::Other);
            let color = if zone == Zone::Other {
                MUTED
            } else {
                palette::categorical(order)
            };
            Layer::uniform(points, Marker::Dot, 3, color.mix(0.6).filled()).labelled(zone.label())
        })
        .collect::<Vec<_>>();
    layers.push(focus_layer(scene, 4));
    let mut chart = map_chart(
        &panels[0],
        &format!("Geographic Zones ({} as squares)", scene.focus()),
        scene.extent(),
    )?;
    draw_layers(&mut chart, &layers)?;

    let stats = &scene.analysis.zones;
    let groups = stats
        .iter()
        .map(|stat| short(stat.zone.label(), 10))
        .collect::<Vec<_>>();
    grouped_bars(
        &panels[1],
        &format!("{} vs Zone Leaders", scene.focus()),
        "Number of branches",
        &groups,
        &[
            BarSeries::new(
                scene.focus(),
                stats.iter().map(|stat| stat.focus_branches as f64).collect(),
                FOCUS,
            ),
            BarSeries::new(
                "Zone leader",
                stats.iter().map(|stat| stat.leader_branches as f64).collect(),
                COMPETITOR,
            ),
        ],
    )?;
    area.present()?;
    Ok(())
}
