use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    board::Column,
    deal::{Deal, MAX_SCORE},
    stage::DealStage,
};

pub const EMPTY_COLUMN: &str = "No deals in this stage";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScoreTier {
    Strong,
    Good,
    Fair,
    Weak,
}

impl ScoreTier {
    pub fn of(score: i32) -> Self {
        match score {
            s if s >= 8 => ScoreTier::Strong,
            s if s >= 6 => ScoreTier::Good,
            s if s >= 4 => ScoreTier::Fair,
            _ => ScoreTier::Weak,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreBar {
    pub label: &'static str,
    pub score: i32,
    pub width_percent: i32,
    pub tier: ScoreTier,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardView {
    pub id: i32,
    pub company_name: String,
    pub sector: String,
    pub amount: String,
    pub round_stage: String,
    pub score_label: String,
    pub bars: [ScoreBar; 4],
}

impl From<&Deal> for CardView {
    fn from(deal: &Deal) -> Self {
        let bars = deal.scores().labelled().map(|(label, score)| ScoreBar {
            label,
            score,
            width_percent: score * 100 / MAX_SCORE,
            tier: ScoreTier::of(score),
        });
        Self {
            id: deal.id,
            company_name: deal.company_name.clone(),
            sector: deal.sector.clone(),
            amount: compact_usd(deal.requested_amount),
            round_stage: deal.round_stage.clone(),
            // Server total; sub-scores are not re-summed here.
            score_label: format!("{}/40", deal.total_score),
            bars,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnView {
    pub stage: DealStage,
    pub title: &'static str,
    pub count: usize,
    pub cards: Vec<CardView>,
}

impl ColumnView {
    /// Placeholder text when the column has no cards.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.cards.is_empty().then_some(EMPTY_COLUMN)
    }
}

impl From<&Column<'_>> for ColumnView {
    fn from(column: &Column<'_>) -> Self {
        Self {
            stage: column.stage,
            title: column.stage.title(),
            count: column.deals.len(),
            cards: column.deals.iter().map(|d| CardView::from(*d)).collect(),
        }
    }
}

const UNITS: [(i64, &str); 4] = [
    (1_000_000_000_000, "T"),
    (1_000_000_000, "B"),
    (1_000_000, "M"),
    (1_000, "K"),
];

/// US-dollar amount in short notation with whole units: `$2M`, `$250K`, `$900`.
pub fn compact_usd(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = amount.abs();
    let round = |v: Decimal| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    // Smallest unit first so a rounded value of 1000 rolls into the next one.
    let mut text = format!("{}", round(abs));
    if round(abs) >= Decimal::from(1_000) {
        for (i, (scale, suffix)) in UNITS.iter().enumerate().rev() {
            let scaled = round(abs / Decimal::from(*scale));
            let has_next = i > 0;
            if scaled < Decimal::from(1_000) || !has_next {
                text = format!("{scaled}{suffix}");
                break;
            }
        }
    }
    format!("{sign}${text}")
}
