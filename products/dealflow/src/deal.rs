use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    api::CreateDealRequest,
    error::{FieldError, ValidationError},
    stage::{DealStage, LossReason, StageKey},
};

pub type DealId = i32;
pub type CompanyId = i32;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// One pipeline opportunity as served by the deal API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub company_name: String,
    pub sector: String,
    pub stage: StageKey,
    #[serde(with = "rust_decimal::serde::str")]
    pub requested_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub valuation: Decimal,
    #[serde(default)]
    pub round_stage: String,
    pub team_score: i32,
    pub product_score: i32,
    pub market_score: i32,
    pub traction_score: i32,
    /// Server-computed. Displayed as-is, never recomputed locally.
    pub total_score: i32,
    #[serde(default)]
    pub founder_name: String,
    #[serde(default)]
    pub founder_email: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_reason: Option<LossReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_company_id: Option<CompanyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    pub fn stage(&self) -> Option<DealStage> {
        self.stage.known()
    }

    pub fn scores(&self) -> DealScores {
        DealScores {
            team: self.team_score,
            product: self.product_score,
            market: self.market_score,
            traction: self.traction_score,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Archived copy after a successful close, linked to the converted company if any.
    pub fn archived_as_closed(&self, company_id: Option<CompanyId>, at: DateTime<Utc>) -> Deal {
        Deal {
            stage: DealStage::Closed.into(),
            archived_at: Some(at),
            converted_company_id: company_id,
            loss_reason: None,
            ..self.clone()
        }
    }

    /// Archived copy after a successful loss.
    pub fn archived_as_lost(&self, reason: LossReason, at: DateTime<Utc>) -> Deal {
        Deal {
            stage: DealStage::Lost.into(),
            archived_at: Some(at),
            converted_company_id: None,
            loss_reason: Some(reason),
            ..self.clone()
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DealScores {
    pub team: i32,
    pub product: i32,
    pub market: i32,
    pub traction: i32,
}

impl Default for DealScores {
    fn default() -> Self {
        Self {
            team: 5,
            product: 5,
            market: 5,
            traction: 5,
        }
    }
}

impl DealScores {
    pub fn total(&self) -> i32 {
        self.team + self.product + self.market + self.traction
    }

    pub fn labelled(&self) -> [(&'static str, i32); 4] {
        [
            ("Team", self.team),
            ("Product", self.product),
            ("Market", self.market),
            ("Traction", self.traction),
        ]
    }

    fn check(&self, errors: &mut Vec<FieldError>) {
        let fields = [
            ("teamScore", self.team),
            ("productScore", self.product),
            ("marketScore", self.market),
            ("tractionScore", self.traction),
        ];
        for (field, score) in fields {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                errors.push(FieldError {
                    field,
                    message: format!("Score must be between {MIN_SCORE} and {MAX_SCORE}"),
                });
            }
        }
    }
}

/// Add-deal form contents, kept as typed text until submission.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDeal {
    pub company_name: String,
    pub sector: String,
    pub requested_amount: String,
    pub valuation: String,
    pub round_stage: String,
    pub scores: DealScores,
    pub founder_name: String,
    pub founder_email: String,
    pub notes: String,
}

impl Default for NewDeal {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            sector: String::new(),
            requested_amount: String::new(),
            valuation: String::new(),
            round_stage: "Seed".into(),
            scores: DealScores::default(),
            founder_name: String::new(),
            founder_email: String::new(),
            notes: String::new(),
        }
    }
}

impl NewDeal {
    /// Checks the form and builds the create request. Nothing is sent when this fails.
    pub fn validate(&self) -> Result<CreateDealRequest, ValidationError> {
        let mut errors = Vec::new();

        if self.company_name.trim().is_empty() {
            errors.push(FieldError {
                field: "companyName",
                message: "Company name is required".into(),
            });
        }
        if self.sector.trim().is_empty() {
            errors.push(FieldError {
                field: "sector",
                message: "Sector is required".into(),
            });
        }
        let requested_amount = positive_amount(&self.requested_amount);
        if requested_amount.is_none() {
            errors.push(FieldError {
                field: "requestedAmount",
                message: "Valid requested amount is required".into(),
            });
        }
        let valuation = positive_amount(&self.valuation);
        if valuation.is_none() {
            errors.push(FieldError {
                field: "valuation",
                message: "Valid valuation is required".into(),
            });
        }
        let email = self.founder_email.trim();
        if email.is_empty() {
            errors.push(FieldError {
                field: "founderEmail",
                message: "Founder email is required".into(),
            });
        } else if !EMAIL.is_match(email) {
            errors.push(FieldError {
                field: "founderEmail",
                message: "Valid email is required".into(),
            });
        }
        self.scores.check(&mut errors);

        match (requested_amount, valuation) {
            (Some(requested_amount), Some(valuation)) if errors.is_empty() => {
                Ok(CreateDealRequest {
                    company_name: self.company_name.trim().to_string(),
                    sector: self.sector.trim().to_string(),
                    stage: DealStage::Incoming,
                    requested_amount,
                    valuation,
                    round_stage: self.round_stage.clone(),
                    team_score: self.scores.team,
                    product_score: self.scores.product,
                    market_score: self.scores.market,
                    traction_score: self.scores.traction,
                    founder_name: self.founder_name.trim().to_string(),
                    founder_email: email.to_string(),
                    notes: self.notes.clone(),
                })
            }
            _ => Err(ValidationError::Fields(errors)),
        }
    }
}

fn positive_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|value| *value > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> NewDeal {
        NewDeal {
            company_name: "TechFlow AI".into(),
            sector: "AI/ML".into(),
            requested_amount: "2000000".into(),
            valuation: "10000000".into(),
            founder_name: "Sarah Chen".into(),
            founder_email: "sarah@techflow.ai".into(),
            scores: DealScores {
                team: 7,
                product: 6,
                market: 8,
                traction: 5,
            },
            ..NewDeal::default()
        }
    }

    #[test]
    fn valid_form_always_creates_incoming_deal() {
        let request = filled().validate().unwrap();
        assert_eq!(request.stage, DealStage::Incoming);
        assert_eq!(request.requested_amount, Decimal::new(2_000_000, 0));
        assert_eq!(request.round_stage, "Seed");
    }

    #[test]
    fn form_reports_every_failing_field() {
        let draft = NewDeal {
            company_name: "  ".into(),
            requested_amount: "-5".into(),
            valuation: "abc".into(),
            founder_email: "not-an-email".into(),
            scores: DealScores {
                team: 0,
                ..DealScores::default()
            },
            ..NewDeal::default()
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.field("companyName"), Some("Company name is required"));
        assert_eq!(err.field("sector"), Some("Sector is required"));
        assert_eq!(err.field("requestedAmount"), Some("Valid requested amount is required"));
        assert_eq!(err.field("valuation"), Some("Valid valuation is required"));
        assert_eq!(err.field("founderEmail"), Some("Valid email is required"));
        assert!(err.field("teamScore").is_some());
        assert!(err.field("productScore").is_none());
    }

    #[test]
    fn score_bounds_are_inclusive() {
        let draft = NewDeal {
            scores: DealScores {
                team: 1,
                product: 10,
                market: 11,
                traction: 0,
            },
            ..filled()
        };
        let err = draft.validate().unwrap_err();
        assert!(err.field("teamScore").is_none());
        assert!(err.field("productScore").is_none());
        assert_eq!(err.field("marketScore"), Some("Score must be between 1 and 10"));
        assert!(err.field("tractionScore").is_some());

        let edges = NewDeal {
            scores: DealScores {
                team: 1,
                product: 10,
                market: 1,
                traction: 10,
            },
            ..filled()
        };
        let request = edges.validate().unwrap();
        assert_eq!(request.team_score, 1);
        assert_eq!(request.traction_score, 10);
    }

    #[test]
    fn missing_email_has_its_own_message() {
        let draft = NewDeal {
            founder_email: String::new(),
            ..filled()
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.field("founderEmail"), Some("Founder email is required"));
    }

    #[test]
    fn score_total_sums_the_four_parts() {
        assert_eq!(filled().scores.total(), 26);
        assert_eq!(DealScores::default().total(), 20);
    }
}
