use std::path::Path;

use super::palette::{self, COMPETITOR, FOCUS, POSITIVE};
use super::primitives::{canvas, grouped_bars, horizontal_bars, text_panel, Bar, BarSeries};
use super::{short, Scene};
use crate::error::ChartError;
use crate::market::BankCount;
use crate::multimetric::METRIC_LABELS;

const OTHERS_AFTER: usize = 8;

fn count_bars(scene: &Scene, counts: &[BankCount]) -> Vec<Bar> {
    counts
        .iter()
        .map(|count| {
            let color = if count.bank == scene.focus() { FOCUS } else { COMPETITOR };
            Bar::new(count.bank.as_str(), count.branches as f64, color)
        })
        .collect()
}

pub(super) fn branch_counts(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let area = canvas(
        path,
        (1400, 800),
        &format!("Branch Network Size Comparison - {} vs Competitors", scene.focus()),
    )?;
    let bars = count_bars(scene, &scene.analysis.market.counts);
    horizontal_bars(&area, "", "Number of branches", &bars, |bar| {
        format!(" {:.0}", bar.value)
    })?;
    area.present()?;
    Ok(())
}

pub(super) fn market_share(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let market = &scene.analysis.market;
    let area = canvas(
        path,
        (1600, 1000),
        &format!("Market Share Analysis - {} Position", scene.focus()),
    )?;
    let columns = area.split_evenly((1, 2));
    let right = columns[1].split_evenly((2, 1));

    let rankings = count_bars(scene, &market.counts);
    let total = market.total_branches as f64;
    horizontal_bars(
        &columns[0],
        "Complete Market Rankings - All Banks",
        "Number of branches",
        &rankings,
        |bar| format!(" {:.0} ({:.1}%)", bar.value, bar.value / total * 100.0),
    )?;

    let mut shares = market
        .counts
        .iter()
        .take(OTHERS_AFTER)
        .map(|count| Bar::new(count.bank.as_str(), count.share_pct, scene.bank_color(&count.bank)))
        .collect::<Vec<_>>();
    let others = market
        .counts
        .iter()
        .skip(OTHERS_AFTER)
        .map(|count| count.share_pct)
        .sum::<f64>();
    if others > 0.0 {
        shares.push(Bar::new("Others", others, palette::MUTED));
    }
    horizontal_bars(&right[0], "Market Share Distribution", "Market share (%)", &shares, |bar| {
        format!(" {:.1}%", bar.value)
    })?;

    let mut versus = market.top_competitors.clone();
    versus.push(market.focus.clone());
    versus.sort_by(|a, b| b.branches.cmp(&a.branches).then_with(|| a.bank.cmp(&b.bank)));
    let gap = market.gap_to_leader;
    let focus = scene.focus().to_owned();
    horizontal_bars(
        &right[1],
        &format!("{} vs Top 5 Competitors", scene.focus()),
        "Number of branches",
        &count_bars(scene, &versus),
        |bar| {
            if bar.label == focus && gap > 0 {
                format!(" {:.0} (gap to leader: {gap})", bar.value)
            } else {
                format!(" {:.0}", bar.value)
            }
        },
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn baku_vs_regions(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let regional = &scene.analysis.regional;
    let area = canvas(path, (1800, 700), "Baku vs Regions")?;
    let panels = area.split_evenly((1, 3));

    let groups = regional
        .banks
        .iter()
        .map(|split| short(&split.bank, 10))
        .collect::<Vec<_>>();
    grouped_bars(
        &panels[0],
        "Baku vs Regions - All Banks",
        "Number of branches",
        &groups,
        &[
            BarSeries::new(
                "Baku",
                regional.banks.iter().map(|split| split.baku as f64).collect(),
                COMPETITOR,
            ),
            BarSeries::new(
                "Regions",
                regional.banks.iter().map(|split| split.regions as f64).collect(),
                FOCUS,
            ),
        ],
    )?;

    let focus_bars = regional
        .bank(scene.focus())
        .map(|split| {
            vec![
                Bar::new("Baku", split.baku as f64, COMPETITOR),
                Bar::new("Regions", split.regions as f64, FOCUS),
            ]
        })
        .unwrap_or_default();
    let focus_total = regional.bank(scene.focus()).map_or(0, |split| split.total()) as f64;
    horizontal_bars(
        &panels[1],
        &format!("{}: Baku vs Regions", scene.focus()),
        "Number of branches",
        &focus_bars,
        |bar| format!(" {:.0} ({:.1}%)", bar.value, palette::ratio(bar.value, focus_total) * 100.0),
    )?;

    let mut by_coverage = regional.banks.iter().collect::<Vec<_>>();
    by_coverage.sort_by(|a, b| b.regional_pct.total_cmp(&a.regional_pct).then_with(|| a.bank.cmp(&b.bank)));
    let coverage = by_coverage
        .iter()
        .map(|split| {
            let color = if split.bank == scene.focus() { FOCUS } else { POSITIVE };
            Bar::new(split.bank.as_str(), split.regional_pct, color)
        })
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[2],
        "Regional Coverage - % of Branches Outside Baku",
        "Percentage (%)",
        &coverage,
        |bar| format!(" {:.1}%", bar.value),
    )?;
    area.present()?;
    Ok(())
}

pub(super) fn multimetric(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let rows = &scene.analysis.multimetric;
    let area = canvas(
        path,
        (1800, 800),
        &format!("Multi-Metric Comparison: {} vs Leaders", scene.focus()),
    )?;
    let panels = area.split_evenly((1, 2));

    let groups = METRIC_LABELS.iter().map(|label| label.to_string()).collect::<Vec<_>>();
    let series = rows
        .iter()
        .map(|row| {
            BarSeries::new(
                row.bank.as_str(),
                row.normalized.values().to_vec(),
                scene.bank_color(&row.bank),
            )
        })
        .collect::<Vec<_>>();
    grouped_bars(&panels[0], "Normalized to 100", "Score", &groups, &series)?;

    let mut table = vec![format!(
        "{:<22}{:>9}{:>12}{:>9}{:>12}",
        "Bank", "Branches", "Geo spread", "Baku %", "Intensity"
    )];
    table.extend(rows.iter().map(|row| {
        let marker = if row.bank == scene.focus() { "*" } else { " " };
        format!(
            "{marker}{:<21}{:>9.0}{:>12.2}{:>8.1}%{:>12.1}",
            short(&row.bank, 20),
            row.raw.branches,
            row.raw.spread,
            row.raw.baku_pct,
            row.raw.avg_intensity
        )
    }));
    text_panel(&panels[1], "Detailed Metrics Comparison", &table)?;
    area.present()?;
    Ok(())
}
