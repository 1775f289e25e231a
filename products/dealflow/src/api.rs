//! Request and response bodies of the deal API. JSON is camelCase throughout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    deal::{CompanyId, DealId},
    stage::{DealStage, LossReason},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealRequest {
    pub company_name: String,
    pub sector: String,
    /// Ignored by the server, which always starts new deals as `incoming`.
    #[serde(default)]
    pub stage: DealStage,
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
    #[serde(default)]
    pub founder_name: String,
    #[serde(default)]
    pub founder_email: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStageRequest {
    pub stage: DealStage,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseDealRequest {
    pub convert_to_portfolio: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub cash_remaining: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub monthly_burn_rate: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub monthly_revenue: Option<Decimal>,
}

impl CloseDealRequest {
    pub fn skip() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseDealResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoseDealRequest {
    pub reason: LossReason,
}

/// One command-palette hit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DealId,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub companies: Vec<SearchHit>,
    #[serde(default)]
    pub deals: Vec<SearchHit>,
}

/// Holding created by closing a deal with conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioCompany {
    pub id: CompanyId,
    pub name: String,
    pub sector: String,
    #[serde(default)]
    pub round_stage: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_invested: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_valuation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cash_remaining: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub monthly_burn_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub monthly_revenue: Decimal,
    pub invested_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skip_close_sends_only_the_flag() {
        let body = serde_json::to_value(CloseDealRequest::skip()).unwrap();
        assert_eq!(body, json!({ "convertToPortfolio": false }));
    }

    #[test]
    fn convert_close_sends_amounts_as_strings() {
        let request = CloseDealRequest {
            convert_to_portfolio: true,
            cash_remaining: Some(Decimal::new(50_000, 0)),
            monthly_burn_rate: Some(Decimal::ZERO),
            monthly_revenue: Some(Decimal::new(125_050, 2)),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["convertToPortfolio"], true);
        assert_eq!(body["cashRemaining"], "50000");
        assert_eq!(body["monthlyRevenue"], "1250.50");
    }

    #[test]
    fn search_response_tolerates_missing_categories() {
        let response: SearchResponse = serde_json::from_value(json!({ "deals": [] })).unwrap();
        assert!(response.companies.is_empty());
    }

    #[test]
    fn close_response_without_company() {
        let response: CloseDealResponse =
            serde_json::from_value(json!({ "message": "Deal closed" })).unwrap();
        assert_eq!(response.company_id, None);
    }
}
