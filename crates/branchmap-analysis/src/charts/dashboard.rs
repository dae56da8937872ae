use std::path::Path;

use plotters::style::BLACK;

use super::palette::{self, COMPETITOR, FOCUS, GAP, MUTED};
use super::primitives::{canvas, grouped_bars, histogram, horizontal_bars, Bar, BarSeries, Guide, Histogram};
use super::Scene;
use crate::error::ChartError;
use crate::proximity::mean;

const RANKED_BANKS: usize = 8;
const LISTED_COMPETITORS: usize = 5;
const INTENSITY_BINS: usize = 12;

pub(super) fn dashboard(path: &Path, scene: &Scene) -> Result<(), ChartError> {
    let analysis = scene.analysis;
    let market = &analysis.market;
    let focus_split = analysis.regional.bank(scene.focus());
    let area = canvas(
        path,
        (2000, 1100),
        &format!("{} - Executive Summary Dashboard", scene.focus()),
    )?;
    let panels = area.split_evenly((2, 3));

    let ranking = market
        .counts
        .iter()
        .take(RANKED_BANKS)
        .enumerate()
        .map(|(i, count)| {
            let color = if count.bank == scene.focus() { FOCUS } else { MUTED };
            Bar::new(format!("#{}. {}", i + 1, count.bank), count.branches as f64, color)
        })
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[0],
        "Market Position: Branch Count Rankings",
        "Number of branches",
        &ranking,
        |bar| format!(" {:.0}", bar.value),
    )?;

    let focus_regional_pct = focus_split.map_or(0.0, |split| split.regional_pct);
    grouped_bars(
        &panels[1],
        &format!("{} vs Industry Average", scene.focus()),
        "Value",
        &[
            String::from("Branches"),
            String::from("Market share %"),
            String::from("Regional %"),
        ],
        &[
            BarSeries::new(
                scene.focus(),
                vec![market.focus.branches as f64, market.focus.share_pct, focus_regional_pct],
                FOCUS,
            ),
            BarSeries::new(
                "Industry avg",
                vec![
                    market.avg_branches_per_bank,
                    market.avg_share_pct,
                    analysis.regional.industry_regional_pct,
                ],
                COMPETITOR,
            ),
        ],
    )?;

    grouped_bars(
        &panels[2],
        "Expansion Opportunities",
        "Number of opportunities",
        &[
            String::from("High gap areas"),
            String::from("Underserved clusters"),
            String::from("Regional gap"),
        ],
        &[BarSeries::new(
            "Opportunities",
            vec![
                analysis.gaps.len() as f64,
                analysis.clusters.underserved.len() as f64,
                analysis.regional.regional_gap(scene.focus()) as f64,
            ],
            GAP,
        )],
    )?;

    let split_bars = focus_split
        .map(|split| {
            vec![
                Bar::new("Baku", split.baku as f64, COMPETITOR),
                Bar::new("Regions", split.regions as f64, FOCUS),
            ]
        })
        .unwrap_or_default();
    let focus_total = market.focus.branches as f64;
    horizontal_bars(
        &panels[3],
        &format!("{}: Geographic Distribution", scene.focus()),
        "Number of branches",
        &split_bars,
        |bar| format!(" {:.0} br. ({:.1}%)", bar.value, palette::ratio(bar.value, focus_total) * 100.0),
    )?;

    let paired = analysis.nearest.pairs.len() as f64;
    let competitors = analysis
        .nearest
        .by_bank
        .iter()
        .take(LISTED_COMPETITORS)
        .map(|entry| Bar::new(entry.bank.as_str(), entry.count as f64, scene.bank_color(&entry.bank)))
        .collect::<Vec<_>>();
    horizontal_bars(
        &panels[4],
        "Most Frequent Direct Competitors",
        "Focus branches",
        &competitors,
        |bar| format!(" {:.0} ({:.0}%)", bar.value, palette::ratio(bar.value, paired) * 100.0),
    )?;

    let counts = analysis
        .intensity
        .counts_for(scene.dataset, scene.focus())
        .map(|count| count as f64)
        .collect::<Vec<_>>();
    let guides = if counts.is_empty() {
        Vec::new()
    } else {
        let average = mean(&counts);
        vec![Guide {
            label: format!("Mean: {average:.1}"),
            value: average,
            color: BLACK,
        }]
    };
    histogram(
        &panels[5],
        "Competitive Intensity Distribution",
        "Competitors within 0.1°",
        "Focus branches",
        &Histogram::of(&counts, INTENSITY_BINS),
        &[FOCUS],
        &guides,
    )?;
    area.present()?;
    Ok(())
}
