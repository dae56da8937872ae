//! Plain-text strategic insights report.

use std::fs;
use std::path::Path;

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::charts::CHARTS;
use crate::config::KM_PER_DEGREE;
use crate::error::AnalysisError;
use crate::pipeline::Analysis;

const RULE: &str = "================================================================================";

#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn line(&mut self, text: impl Into<String>) {
        self.0.push(text.into());
    }

    fn blank(&mut self) {
        self.0.push(String::new());
    }

    fn heading(&mut self, title: &str) {
        self.line(RULE);
        self.line(title);
        self.line(RULE);
        self.blank();
    }

    fn bullet(&mut self, indent: usize, text: impl AsRef<str>) {
        self.0.push(format!("{:indent$}• {}", "", text.as_ref()));
    }
}

fn joined(names: impl Iterator<Item = impl AsRef<str>>) -> String {
    let names = names.map(|name| name.as_ref().to_owned()).collect::<Vec<_>>();
    if names.is_empty() {
        String::from("none identified")
    } else {
        names.join(", ")
    }
}

/// Renders the report. `generated` is the timestamp printed in the header.
pub fn render(analysis: &Analysis, charts_dir: &Path, generated: OffsetDateTime) -> String {
    let focus = analysis.focus_bank.as_str();
    let market = &analysis.market;
    let count = market.focus.branches;
    let share = market.focus.share_pct;
    let (baku, regions) = analysis
        .regional
        .bank(focus)
        .map_or((0, 0), |split| (split.baku, split.regions));
    let baku_pct = crate::market::percentage(baku, count);
    let regional_pct = crate::market::percentage(regions, count);
    let industry_regional = analysis.regional.industry_regional_pct;
    let intensity = analysis.intensity.of_bank(focus).map_or(0.0, |entry| entry.average);
    let gaps = analysis.gaps.len();
    let growth = &market.growth;
    let top_three = joined(analysis.nearest.by_bank.iter().take(3).map(|entry| entry.bank.as_str()));
    let stamp = generated
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| generated.to_string());

    let mut out = Lines::default();
    out.blank();
    out.line(RULE);
    out.line(format!("{} - STRATEGIC ANALYSIS & ACTIONABLE INSIGHTS", focus.to_uppercase()));
    out.line(RULE);
    out.line(format!("Generated: {stamp}"));
    out.blank();

    out.line("EXECUTIVE SUMMARY");
    out.line(RULE);
    out.blank();
    out.line("CURRENT MARKET POSITION:");
    out.bullet(0, format!("Market Rank: #{} out of {} banks", market.focus_rank, market.bank_count()));
    out.bullet(0, format!("Total Branches: {count}"));
    out.bullet(0, format!("Market Share: {share:.1}%"));
    out.bullet(
        0,
        format!("Gap to Market Leader ({}): {} branches", market.leader.bank, market.gap_to_leader),
    );
    out.blank();
    out.line("GEOGRAPHIC FOOTPRINT:");
    out.bullet(0, format!("Baku Concentration: {baku}/{count} branches ({baku_pct:.1}%)"));
    out.bullet(0, format!("Regional Presence: {regions}/{count} branches ({regional_pct:.1}%)"));
    out.bullet(
        0,
        format!("Average Competitive Intensity: {intensity:.1} competitors within 10km radius"),
    );
    out.blank();
    out.line("COMPETITIVE LANDSCAPE:");
    out.bullet(0, format!("Most Frequent Direct Competitors: {top_three}"));
    out.bullet(
        0,
        format!(
            "Average Distance to Nearest Competitor: {:.4}° (~{:.1}km)",
            analysis.nearest.mean_deg,
            analysis.nearest.mean_km()
        ),
    );
    out.bullet(
        0,
        format!("Coverage Gaps: {gaps} competitor locations >30km from the nearest {focus} branch"),
    );
    out.blank();

    out.heading("STRATEGIC RECOMMENDATIONS");

    out.line("1. REGIONAL EXPANSION (PRIORITY: HIGH)");
    out.blank();
    out.line("   Current Situation:");
    let relation = if regional_pct < industry_regional { "below" } else { "above" };
    out.bullet(
        3,
        format!("{focus}'s regional coverage ({regional_pct:.1}%) is {relation} the industry average ({industry_regional:.1}%)"),
    );
    out.bullet(3, format!("Concentration in Baku ({baku_pct:.1}%) limits growth potential"));
    out.bullet(
        3,
        format!("{gaps} high-potential locations identified where competitors operate without {focus} presence"),
    );
    out.bullet(
        3,
        format!(
            "{} of {} regional clusters are underserved (share below 5%)",
            analysis.clusters.underserved.len(),
            analysis.clusters.clusters.len()
        ),
    );
    out.blank();
    out.line("   Recommended Actions:");
    out.bullet(3, "Prioritize expansion into regional cities with existing competitor presence");
    out.bullet(3, format!("Focus on underserved clusters where {focus} market share is below 5%"));
    out.bullet(
        3,
        format!(
            "Close the regional gap of {} branches to the best covered bank",
            analysis.regional.regional_gap(focus)
        ),
    );
    out.bullet(3, "Allocate 60% of new branch budget to regional expansion");
    out.blank();
    out.line("   Expected Impact:");
    out.bullet(3, "Increase market coverage by accessing untapped customer segments");
    out.bullet(3, "Reduce dependency on Baku market");
    out.bullet(3, "Improve competitive positioning in regional markets");
    out.blank();

    out.line("2. STRATEGIC LOCATION SELECTION (PRIORITY: HIGH)");
    out.blank();
    out.line("   Current Situation:");
    out.bullet(3, format!("Gap Analysis identified {gaps} competitor locations far from {focus} branches"));
    out.bullet(
        3,
        format!(
            "Growth Opportunity Score analysis pinpointed top {} expansion coordinates",
            analysis.top_opportunities.len()
        ),
    );
    out.bullet(
        3,
        format!("Current branches face competitive intensity of {intensity:.1} competitors within 10km"),
    );
    out.blank();
    out.line("   Top Expansion Locations:");
    for (rank, cell) in analysis.top_opportunities.iter().take(5).enumerate() {
        out.bullet(
            3,
            format!(
                "#{} ({:.4}, {:.4}) score {:.2}, {:.1}km from nearest {focus} branch",
                rank + 1,
                cell.location.lat,
                cell.location.lon,
                cell.score,
                cell.focus_distance * KM_PER_DEGREE
            ),
        );
    }
    out.bullet(3, "Refer to Chart 13 for the full ranked list");
    out.blank();
    out.line("   Recommended Actions:");
    out.bullet(
        3,
        format!("Balance distance from existing {focus} branches against proximity to competitor activity"),
    );
    out.bullet(3, format!("Prioritize locations with distance >0.3° from nearest {focus} branch"));
    out.bullet(3, "Focus on areas with moderate competitor presence");
    out.blank();

    out.line("3. COMPETITIVE POSITIONING (PRIORITY: MEDIUM)");
    out.blank();
    out.line("   Current Situation:");
    out.bullet(3, format!("Main competitors in proximity: {top_three}"));
    out.bullet(
        3,
        format!("Average {intensity:.1} competitors within 10km of each {focus} branch"),
    );
    out.blank();
    out.line("   Recommended Actions:");
    out.bullet(3, "Develop differentiation strategy beyond location convenience");
    out.bullet(3, "Focus on service excellence, digital banking, and customer experience");
    out.bullet(3, "In highly competitive areas, emphasize brand differentiation over proximity");
    out.blank();

    out.line("4. MARKET SHARE GROWTH PATH (PRIORITY: MEDIUM)");
    out.blank();
    out.line("   Current Situation:");
    out.bullet(3, format!("Current market share: {share:.1}%"));
    out.bullet(
        3,
        format!(
            "To reach {:.0}% market share: Need {} additional branches",
            growth.target_share_pct, growth.needed
        ),
    );
    match market.gap_to_fifth {
        Some(gap) => out.bullet(3, format!("To match #5 position: Need {gap} additional branches")),
        None => out.bullet(3, "Fewer than five banks in the market"),
    }
    out.blank();
    out.line("   Recommended Growth Strategy:");
    out.blank();
    let [first, second, third] = growth.phases;
    out.line(format!("   Phase 1 (Year 1): Add {first} branches"));
    out.bullet(3, "60% in regional areas (identified gap locations)");
    out.bullet(3, "40% in Baku suburbs (underserved neighborhoods)");
    out.blank();
    out.line(format!("   Phase 2 (Year 2): Add {second} branches"));
    out.bullet(3, "Continue regional expansion");
    out.bullet(3, "Enter new regional clusters identified in cluster analysis");
    out.blank();
    out.line(format!("   Phase 3 (Year 3): Add {third} branches"));
    out.bullet(3, "Fill remaining gaps in network coverage");
    out.bullet(3, "Optimize branch network based on performance data");
    out.blank();
    out.line("   Expected Impact:");
    out.bullet(3, format!("Achieve {:.0}% market share within 3 years", growth.target_share_pct));
    if market.in_top_five() {
        out.bullet(3, format!("Consolidate the current #{} position", market.focus_rank));
    } else {
        out.bullet(
            3,
            format!("Improved competitive position from #{} to top 5", market.focus_rank),
        );
    }
    out.blank();

    out.line("5. NETWORK OPTIMIZATION (PRIORITY: LOW)");
    out.blank();
    out.line("   Recommended Actions:");
    out.bullet(3, format!("Conduct performance audit of existing {count} branches"));
    out.bullet(3, "Consider relocating underperforming branches to gap areas");
    out.bullet(3, "Invest in digital banking to serve customers in areas without branches");
    out.blank();

    out.heading("KEY PERFORMANCE INDICATORS TO TRACK");
    out.line("1. Market Share Metrics:");
    out.bullet(3, "Total branch count vs competitors");
    out.bullet(
        3,
        format!("Market share percentage (target: {:.0}% within 3 years)", growth.target_share_pct),
    );
    out.bullet(3, "Rank position (target: Top 5 within 3 years)");
    out.blank();
    out.line("2. Geographic Coverage:");
    out.bullet(3, "Regional branch percentage (target: >40% within 2 years)");
    out.bullet(3, format!("Number of cities with {focus} presence"));
    out.blank();
    out.line("3. Competitive Metrics:");
    out.bullet(3, "Average competitive intensity per branch");
    out.bullet(
        3,
        format!("Market gaps closed (target: 50% of identified {gaps} gaps within 3 years)"),
    );
    out.blank();

    out.heading("CONCLUSION");
    out.line(format!(
        "{focus} holds {count} branches ({share:.1}% market share, ranked #{}).",
        market.focus_rank
    ));
    out.blank();
    out.line("OPPORTUNITIES:");
    out.line(format!("✓ {gaps} identified gap locations with competitor presence but no {focus} branch"));
    out.line(format!("✓ Regional markets hold only {regional_pct:.1}% of {focus} branches"));
    out.line(format!(
        "✓ Path to {:.0}% market share with {} strategic branch additions",
        growth.target_share_pct, growth.needed
    ));
    out.blank();
    out.line("CHALLENGES:");
    out.line(format!(
        "⚠ Competitive intensity of {intensity:.1} competitors per branch within 10km"
    ));
    out.line(format!(
        "⚠ Significant gap to market leaders ({}: {} branches)",
        market.leader.bank, market.leader.branches
    ));
    out.blank();

    out.heading("END OF REPORT");
    out.line("For detailed visualizations, refer to charts:");
    for chart in &CHARTS {
        out.bullet(0, format!("{}: {}", chart.file, chart.description));
    }
    out.blank();
    out.line(format!("All charts saved in: {}", charts_dir.display()));
    out.blank();

    out.0.join("\n")
}

/// Writes the report, creating the parent directory.
pub fn write(path: &Path, report: &str) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| AnalysisError::io(parent, source))?;
    }
    fs::write(path, report).map_err(|source| AnalysisError::io(path, source))?;
    info!(path = %path.display(), "report written");
    Ok(())
}
