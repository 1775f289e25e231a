use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Pipeline position of a deal. Column order on the board follows [`DealStage::ALL`].
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    #[default]
    Incoming,
    Screening,
    DueDiligence,
    TermSheet,
    Closed,
    Lost,
}

impl DealStage {
    pub const ALL: [DealStage; 6] = [
        DealStage::Incoming,
        DealStage::Screening,
        DealStage::DueDiligence,
        DealStage::TermSheet,
        DealStage::Closed,
        DealStage::Lost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::Incoming => "incoming",
            DealStage::Screening => "screening",
            DealStage::DueDiligence => "due_diligence",
            DealStage::TermSheet => "term_sheet",
            DealStage::Closed => "closed",
            DealStage::Lost => "lost",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DealStage::Incoming => "Incoming",
            DealStage::Screening => "Screening",
            DealStage::DueDiligence => "Due Diligence",
            DealStage::TermSheet => "Term Sheet",
            DealStage::Closed => "Closed",
            DealStage::Lost => "Lost",
        }
    }

    /// `closed` and `lost` archive the deal.
    pub fn is_terminal(self) -> bool {
        matches!(self, DealStage::Closed | DealStage::Lost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| ParseError::UnknownStage(value.to_string()))
    }
}

/// Stage value as received from the wire.
///
/// Deals whose stage is not one of the six known values still decode; they just
/// never land in a board column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageKey {
    Known(DealStage),
    Unknown(String),
}

impl StageKey {
    pub fn known(&self) -> Option<DealStage> {
        match self {
            StageKey::Known(stage) => Some(*stage),
            StageKey::Unknown(_) => None,
        }
    }

    pub fn is(&self, stage: DealStage) -> bool {
        self.known() == Some(stage)
    }
}

impl From<DealStage> for StageKey {
    fn from(value: DealStage) -> Self {
        StageKey::Known(value)
    }
}

impl PartialEq<DealStage> for StageKey {
    fn eq(&self, other: &DealStage) -> bool {
        self.is(*other)
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKey::Known(stage) => stage.fmt(f),
            StageKey::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Why a deal was archived as `lost`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Passed,
    ValuationTooHigh,
    CompetitorWon,
    FounderDeclined,
    DealFellThrough,
    Other,
}

impl LossReason {
    pub const ALL: [LossReason; 6] = [
        LossReason::Passed,
        LossReason::ValuationTooHigh,
        LossReason::CompetitorWon,
        LossReason::FounderDeclined,
        LossReason::DealFellThrough,
        LossReason::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LossReason::Passed => "passed",
            LossReason::ValuationTooHigh => "valuation_too_high",
            LossReason::CompetitorWon => "competitor_won",
            LossReason::FounderDeclined => "founder_declined",
            LossReason::DealFellThrough => "deal_fell_through",
            LossReason::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LossReason::Passed => "Passed on Opportunity",
            LossReason::ValuationTooHigh => "Valuation Too High",
            LossReason::CompetitorWon => "Competitor Won",
            LossReason::FounderDeclined => "Founder Declined",
            LossReason::DealFellThrough => "Deal Fell Through",
            LossReason::Other => "Other",
        }
    }
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossReason {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LossReason::ALL
            .into_iter()
            .find(|reason| reason.as_str() == value)
            .ok_or_else(|| ParseError::UnknownLossReason(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_render_left_to_right() {
        let titles: Vec<_> = DealStage::ALL.iter().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            ["Incoming", "Screening", "Due Diligence", "Term Sheet", "Closed", "Lost"]
        );
        assert!(DealStage::Closed.is_terminal());
        assert!(DealStage::Lost.is_terminal());
        assert!(!DealStage::TermSheet.is_terminal());
    }

    #[test]
    fn new_deals_default_to_incoming() {
        assert_eq!(DealStage::default(), DealStage::Incoming);
        assert_eq!(DealStage::default(), DealStage::ALL[0]);
    }

    #[test]
    fn parse_rejects_unknown_stage() {
        assert_eq!("due_diligence".parse::<DealStage>().unwrap(), DealStage::DueDiligence);
        assert!("archived".parse::<DealStage>().is_err());
        assert!("Closed".parse::<DealStage>().is_err());
    }

    #[test]
    fn stage_key_keeps_unknown_values() {
        let known: StageKey = serde_json::from_str("\"term_sheet\"").unwrap();
        assert_eq!(known, StageKey::Known(DealStage::TermSheet));
        let unknown: StageKey = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(unknown, StageKey::Unknown("on_hold".into()));
        assert_eq!(unknown.known(), None);
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"on_hold\"");
    }

    #[test]
    fn loss_reasons_use_snake_case_on_the_wire() {
        let json = serde_json::to_string(&LossReason::ValuationTooHigh).unwrap();
        assert_eq!(json, "\"valuation_too_high\"");
        assert_eq!("founder_declined".parse::<LossReason>().unwrap(), LossReason::FounderDeclined);
        assert!("bad_timing".parse::<LossReason>().is_err());
    }
}
