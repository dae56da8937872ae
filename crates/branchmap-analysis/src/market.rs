//! Branch counts, market share and the focus bank's position.

use std::collections::HashMap;

use serde::Serialize;

use crate::dataset::{Branch, Dataset};
use crate::error::AnalysisError;

const TARGET_SHARE: f64 = 0.10;
const PHASE_WEIGHTS: [f64; 3] = [0.40, 0.35, 0.25];
const TOP_COMPETITORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankCount {
    pub bank: String,
    pub branches: usize,
    pub share_pct: f64,
}

/// Branch count per bank, largest first, ties broken by name.
pub fn bank_counts<'a>(branches: impl IntoIterator<Item = &'a Branch>) -> Vec<BankCount> {
    let mut tally: HashMap<&str, usize> = HashMap::new();
    let mut total = 0_usize;
    for branch in branches {
        *tally.entry(branch.bank.as_str()).or_default() += 1;
        total += 1;
    }

    let mut counts = tally
        .into_iter()
        .map(|(bank, branches)| BankCount {
            bank: bank.to_owned(),
            branches,
            share_pct: percentage(branches, total),
        })
        .collect::<Vec<_>>();
    counts.sort_by(|a, b| b.branches.cmp(&a.branches).then_with(|| a.bank.cmp(&b.bank)));
    counts
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Branches needed to reach a 10 % share, split over three phases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPlan {
    pub target_share_pct: f64,
    pub target_branches: i64,
    /// Negative when the focus bank is already above the target.
    pub needed: i64,
    pub phases: [i64; 3],
}

impl GrowthPlan {
    fn for_share(total: usize, focus: usize) -> Self {
        let target_branches = (total as f64 * TARGET_SHARE).floor() as i64;
        let needed = target_branches - focus as i64;
        Self {
            target_share_pct: TARGET_SHARE * 100.0,
            target_branches,
            needed,
            phases: PHASE_WEIGHTS.map(|weight| (needed as f64 * weight) as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub total_branches: usize,
    pub counts: Vec<BankCount>,
    pub focus: BankCount,
    /// One plus the number of banks with strictly more branches.
    pub focus_rank: usize,
    pub leader: BankCount,
    pub gap_to_leader: usize,
    pub top_competitors: Vec<BankCount>,
    /// `None` when fewer than five banks are present.
    pub gap_to_fifth: Option<i64>,
    pub growth: GrowthPlan,
    pub avg_branches_per_bank: f64,
    pub avg_share_pct: f64,
}

impl MarketSummary {
    pub fn bank_count(&self) -> usize {
        self.counts.len()
    }

    pub fn in_top_five(&self) -> bool {
        self.focus_rank <= TOP_COMPETITORS
    }
}

pub fn market_summary(dataset: &Dataset, focus_bank: &str) -> Result<MarketSummary, AnalysisError> {
    let counts = bank_counts(dataset.branches());
    let focus = counts
        .iter()
        .find(|count| count.bank == focus_bank)
        .cloned()
        .ok_or_else(|| AnalysisError::FocusBankMissing {
            bank: focus_bank.to_owned(),
        })?;
    // `focus` exists, so `counts` is non-empty.
    let leader = counts[0].clone();
    let total = dataset.len();

    let focus_rank = counts
        .iter()
        .filter(|count| count.branches > focus.branches)
        .count()
        + 1;
    let top_competitors = counts
        .iter()
        .filter(|count| count.bank != focus_bank)
        .take(TOP_COMPETITORS)
        .cloned()
        .collect();
    let gap_to_fifth = counts
        .get(TOP_COMPETITORS - 1)
        .map(|fifth| fifth.branches as i64 - focus.branches as i64);

    Ok(MarketSummary {
        total_branches: total,
        focus_rank,
        gap_to_leader: leader.branches - focus.branches,
        top_competitors,
        gap_to_fifth,
        growth: GrowthPlan::for_share(total, focus.branches),
        avg_branches_per_bank: total as f64 / counts.len() as f64,
        avg_share_pct: 100.0 / counts.len() as f64,
        leader,
        focus,
        counts,
    })
}
