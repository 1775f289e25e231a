//! REST handlers for the deal pipeline.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use entity::{deal, portfolio_company};
use platform_api::{ApiError, ApiResult, internal_error};
use products_dealflow::{
    Deal, DealStage, LossReason, StageKey,
    api::{CloseDealRequest, CloseDealResponse, CreateDealRequest, SearchHit, SearchResponse},
    deal::{MAX_SCORE, MIN_SCORE},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{http::AppState, portfolio};

/// Per category.
const SEARCH_LIMIT: u64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub archived: Option<bool>,
    pub stage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StageBody {
    pub stage: String,
}

#[derive(Debug, Deserialize)]
pub struct LoseBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[instrument(name = "deals.list", skip_all, fields(archived = ?query.archived, stage = ?query.stage))]
pub async fn list_deals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Deal>>> {
    let mut select = deal::Entity::find();
    if let Some(raw) = query.stage.as_deref() {
        let stage = parse_stage(raw)?;
        select = select.filter(deal::Column::Stage.eq(stage_to_entity(stage)));
    }
    select = match (query.archived, query.stage.is_some()) {
        (Some(true), _) => select
            .filter(deal::Column::ArchivedAt.is_not_null())
            .order_by_desc(deal::Column::ArchivedAt),
        (Some(false), _) | (None, false) => select.filter(deal::Column::ArchivedAt.is_null()),
        (None, true) => select,
    };
    let rows = select
        .order_by_desc(deal::Column::CreatedAt)
        .order_by_desc(deal::Column::Id)
        .all(&state.pool)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows.into_iter().map(to_deal).collect()))
}

#[instrument(name = "deals.create", skip_all, fields(company = %body.company_name))]
pub async fn create_deal(
    State(state): State<AppState>,
    Json(body): Json<CreateDealRequest>,
) -> ApiResult<(StatusCode, Json<Deal>)> {
    validate_create(&body)?;
    let now = Utc::now();
    let model = deal::ActiveModel {
        company_name: Set(body.company_name.trim().to_string()),
        sector: Set(body.sector.trim().to_string()),
        stage: Set(deal::Stage::Incoming),
        round_stage: Set(body.round_stage.trim().to_string()),
        requested_amount_cents: Set(to_cents(body.requested_amount)?),
        valuation_cents: Set(to_cents(body.valuation)?),
        team_score: Set(body.team_score),
        product_score: Set(body.product_score),
        market_score: Set(body.market_score),
        traction_score: Set(body.traction_score),
        founder_name: Set(body.founder_name.trim().to_string()),
        founder_email: Set(body.founder_email.trim().to_string()),
        notes: Set(body.notes.clone()),
        loss_reason: Set(None),
        archived_at: Set(None),
        converted_company_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let saved = model.insert(&state.pool).await.map_err(internal_error)?;
    info!(deal_id = saved.id, "deal created");
    Ok((StatusCode::CREATED, Json(to_deal(saved))))
}

/// Non-terminal moves only; archiving goes through close or lose.
#[instrument(name = "deals.updateStage", skip_all, fields(deal_id = id, stage = %body.stage))]
pub async fn update_stage(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StageBody>,
) -> ApiResult<Json<Deal>> {
    let stage = parse_stage(&body.stage)?;
    if stage.is_terminal() {
        return Err(ApiError::invalid(
            "Use the close or lose endpoint to archive a deal",
        ));
    }
    let found = find_active(&state.pool, id).await?;
    let mut model: deal::ActiveModel = found.into();
    model.stage = Set(stage_to_entity(stage));
    model.updated_at = Set(Utc::now());
    let updated = model.update(&state.pool).await.map_err(internal_error)?;
    Ok(Json(to_deal(updated)))
}

#[instrument(name = "deals.close", skip_all, fields(deal_id = id, convert = body.convert_to_portfolio))]
pub async fn close_deal(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<CloseDealRequest>,
) -> ApiResult<Json<CloseDealResponse>> {
    let cash_remaining = optional_cents(body.cash_remaining)?;
    let monthly_burn_rate = optional_cents(body.monthly_burn_rate)?;
    let monthly_revenue = optional_cents(body.monthly_revenue)?;

    let txn = state.pool.begin().await.map_err(internal_error)?;
    let found = find_active(&txn, id).await?;
    let now = Utc::now();

    let company_id = if body.convert_to_portfolio {
        let company = portfolio_company::ActiveModel {
            name: Set(found.company_name.clone()),
            sector: Set(found.sector.clone()),
            round_stage: Set(found.round_stage.clone()),
            amount_invested_cents: Set(found.requested_amount_cents),
            current_valuation_cents: Set(found.valuation_cents),
            cash_remaining_cents: Set(cash_remaining),
            monthly_burn_rate_cents: Set(monthly_burn_rate),
            monthly_revenue_cents: Set(monthly_revenue),
            invested_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(internal_error)?;
        Some(company.id)
    } else {
        None
    };

    let mut model: deal::ActiveModel = found.into();
    model.stage = Set(deal::Stage::Closed);
    model.archived_at = Set(Some(now));
    model.converted_company_id = Set(company_id);
    model.loss_reason = Set(None);
    model.updated_at = Set(now);
    model.update(&txn).await.map_err(internal_error)?;
    txn.commit().await.map_err(internal_error)?;

    info!(deal_id = id, company_id = ?company_id, "deal closed");
    let message = if company_id.is_some() {
        "Deal closed and converted to portfolio company"
    } else {
        "Deal closed"
    };
    Ok(Json(CloseDealResponse {
        company_id,
        message: message.to_string(),
    }))
}

#[instrument(name = "deals.lose", skip_all, fields(deal_id = id, reason = %body.reason))]
pub async fn lose_deal(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<LoseBody>,
) -> ApiResult<Json<MessageBody>> {
    let reason = LossReason::from_str(&body.reason)
        .map_err(|_| ApiError::invalid("Invalid loss reason"))?;
    let found = find_active(&state.pool, id).await?;
    let now = Utc::now();
    let mut model: deal::ActiveModel = found.into();
    model.stage = Set(deal::Stage::Lost);
    model.loss_reason = Set(Some(loss_to_entity(reason)));
    model.archived_at = Set(Some(now));
    model.updated_at = Set(now);
    model.update(&state.pool).await.map_err(internal_error)?;
    info!(deal_id = id, reason = reason.as_str(), "deal lost");
    Ok(Json(MessageBody {
        message: "Deal marked as lost and archived",
    }))
}

#[instrument(name = "deals.search", skip_all)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let trimmed = query.q.trim();
    if trimmed.is_empty() {
        return Ok(Json(SearchResponse::default()));
    }
    let pattern = format!("%{}%", trimmed.to_lowercase());
    let companies = portfolio::search_companies(&state.pool, &pattern, SEARCH_LIMIT).await?;
    let name_expr = Expr::expr(Func::lower(Expr::col(deal::Column::CompanyName)));
    let sector_expr = Expr::expr(Func::lower(Expr::col(deal::Column::Sector)));
    let rows = deal::Entity::find()
        .filter(
            Condition::any()
                .add(name_expr.like(pattern.clone()))
                .add(sector_expr.like(pattern)),
        )
        .order_by_desc(deal::Column::CreatedAt)
        .limit(SEARCH_LIMIT)
        .all(&state.pool)
        .await
        .map_err(internal_error)?;
    let deals = rows
        .into_iter()
        .map(|row| SearchHit {
            id: row.id,
            kind: "deal".into(),
            description: format!("{} • {}", row.sector, stage_from_entity(row.stage)),
            name: row.company_name,
            url: "/deals".into(),
        })
        .collect();
    Ok(Json(SearchResponse { companies, deals }))
}

async fn find_active<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<deal::Model> {
    let found = deal::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(internal_error)?
        .ok_or(ApiError::NotFound("Deal not found"))?;
    if found.is_archived() {
        return Err(ApiError::Conflict("Deal is already archived".into()));
    }
    Ok(found)
}

fn validate_create(body: &CreateDealRequest) -> ApiResult<()> {
    if body.company_name.trim().is_empty() {
        return Err(ApiError::invalid("companyName is required"));
    }
    if body.sector.trim().is_empty() {
        return Err(ApiError::invalid("sector is required"));
    }
    if body.requested_amount.is_sign_negative() || body.valuation.is_sign_negative() {
        return Err(ApiError::invalid("amounts must not be negative"));
    }
    let scores = [
        ("teamScore", body.team_score),
        ("productScore", body.product_score),
        ("marketScore", body.market_score),
        ("tractionScore", body.traction_score),
    ];
    for (field, score) in scores {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(ApiError::invalid(format!(
                "{field} must be between {MIN_SCORE} and {MAX_SCORE}"
            )));
        }
    }
    Ok(())
}

fn parse_stage(raw: &str) -> ApiResult<DealStage> {
    DealStage::from_str(raw).map_err(|_| ApiError::invalid(format!("Invalid stage: {raw}")))
}

fn to_cents(value: Decimal) -> ApiResult<i64> {
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.round().to_i64())
        .ok_or_else(|| ApiError::invalid("amount out of range"))
}

fn optional_cents(value: Option<Decimal>) -> ApiResult<i64> {
    value.map(to_cents).unwrap_or(Ok(0))
}

pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2).normalize()
}

pub(crate) fn to_deal(model: deal::Model) -> Deal {
    let total_score = model.total_score();
    Deal {
        id: model.id,
        company_name: model.company_name,
        sector: model.sector,
        stage: StageKey::Known(stage_from_entity(model.stage)),
        requested_amount: from_cents(model.requested_amount_cents),
        valuation: from_cents(model.valuation_cents),
        round_stage: model.round_stage,
        team_score: model.team_score,
        product_score: model.product_score,
        market_score: model.market_score,
        traction_score: model.traction_score,
        total_score,
        founder_name: model.founder_name,
        founder_email: model.founder_email,
        notes: model.notes,
        loss_reason: model.loss_reason.map(loss_from_entity),
        archived_at: model.archived_at,
        converted_company_id: model.converted_company_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub(crate) fn stage_to_entity(stage: DealStage) -> deal::Stage {
    match stage {
        DealStage::Incoming => deal::Stage::Incoming,
        DealStage::Screening => deal::Stage::Screening,
        DealStage::DueDiligence => deal::Stage::DueDiligence,
        DealStage::TermSheet => deal::Stage::TermSheet,
        DealStage::Closed => deal::Stage::Closed,
        DealStage::Lost => deal::Stage::Lost,
    }
}

fn stage_from_entity(stage: deal::Stage) -> DealStage {
    match stage {
        deal::Stage::Incoming => DealStage::Incoming,
        deal::Stage::Screening => DealStage::Screening,
        deal::Stage::DueDiligence => DealStage::DueDiligence,
        deal::Stage::TermSheet => DealStage::TermSheet,
        deal::Stage::Closed => DealStage::Closed,
        deal::Stage::Lost => DealStage::Lost,
    }
}

pub(crate) fn loss_to_entity(reason: LossReason) -> deal::LossReason {
    match reason {
        LossReason::Passed => deal::LossReason::Passed,
        LossReason::ValuationTooHigh => deal::LossReason::ValuationTooHigh,
        LossReason::CompetitorWon => deal::LossReason::CompetitorWon,
        LossReason::FounderDeclined => deal::LossReason::FounderDeclined,
        LossReason::DealFellThrough => deal::LossReason::DealFellThrough,
        LossReason::Other => deal::LossReason::Other,
    }
}

fn loss_from_entity(reason: deal::LossReason) -> LossReason {
    match reason {
        deal::LossReason::Passed => LossReason::Passed,
        deal::LossReason::ValuationTooHigh => LossReason::ValuationTooHigh,
        deal::LossReason::CompetitorWon => LossReason::CompetitorWon,
        deal::LossReason::FounderDeclined => LossReason::FounderDeclined,
        deal::LossReason::DealFellThrough => LossReason::DealFellThrough,
        deal::LossReason::Other => LossReason::Other,
    }
}
