//! Read-only access to companies created by converting closed deals.

use axum::{
    Json,
    extract::{Path, State},
};
use entity::portfolio_company;
use platform_api::{ApiError, ApiResult, internal_error};
use products_dealflow::api::{PortfolioCompany, SearchHit};
use sea_orm::{
    ConnectionTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use tracing::instrument;

use crate::{deals::from_cents, http::AppState};

#[instrument(name = "portfolio.list", skip_all)]
pub async fn list_companies(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PortfolioCompany>>> {
    let rows = portfolio_company::Entity::find()
        .order_by_desc(portfolio_company::Column::InvestedAt)
        .order_by_desc(portfolio_company::Column::Id)
        .all(&state.pool)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows.into_iter().map(to_company).collect()))
}

#[instrument(name = "portfolio.get", skip_all, fields(company_id = id))]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<PortfolioCompany>> {
    let found = portfolio_company::Entity::find_by_id(id)
        .one(&state.pool)
        .await
        .map_err(internal_error)?
        .ok_or(ApiError::NotFound("Company not found"))?;
    Ok(Json(to_company(found)))
}

/// `pattern` is an already lowercased LIKE pattern.
pub(crate) async fn search_companies<C: ConnectionTrait>(
    conn: &C,
    pattern: &str,
    limit: u64,
) -> ApiResult<Vec<SearchHit>> {
    let name_expr = Expr::expr(Func::lower(Expr::col(portfolio_company::Column::Name)));
    let sector_expr = Expr::expr(Func::lower(Expr::col(portfolio_company::Column::Sector)));
    let rows = portfolio_company::Entity::find()
        .filter(
            Condition::any()
                .add(name_expr.like(pattern))
                .add(sector_expr.like(pattern)),
        )
        .order_by_desc(portfolio_company::Column::InvestedAt)
        .limit(limit)
        .all(conn)
        .await
        .map_err(internal_error)?;
    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            id: row.id,
            kind: "company".into(),
            description: format!("{} • {}", row.sector, row.round_stage),
            url: format!("/portfolio/{}", row.id),
            name: row.name,
        })
        .collect())
}

fn to_company(model: portfolio_company::Model) -> PortfolioCompany {
    PortfolioCompany {
        id: model.id,
        name: model.name,
        sector: model.sector,
        round_stage: model.round_stage,
        amount_invested: from_cents(model.amount_invested_cents),
        current_valuation: from_cents(model.current_valuation_cents),
        cash_remaining: from_cents(model.cash_remaining_cents),
        monthly_burn_rate: from_cents(model.monthly_burn_rate_cents),
        monthly_revenue: from_cents(model.monthly_revenue_cents),
        invested_at: model.invested_at,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{app, call, create};

    #[tokio::test]
    async fn converted_company_is_readable_and_searchable() {
        let (app, _) = app().await;
        let id = create(&app, "LogiChain").await;
        let (status, closed) = call(
            &app,
            Method::POST,
            &format!("/api/deals/{id}/close"),
            Some(json!({
                "convertToPortfolio": true,
                "cashRemaining": "900000",
                "monthlyBurnRate": "45000.25"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let company_id = closed["companyId"].as_i64().unwrap();

        let (status, company) =
            call(&app, Method::GET, &format!("/api/portfolio/companies/{company_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(company["name"], "LogiChain");
        assert_eq!(company["roundStage"], "Series A");
        assert_eq!(company["amountInvested"], "1500000");
        assert_eq!(company["currentValuation"], "12000000.5");
        assert_eq!(company["cashRemaining"], "900000");
        assert_eq!(company["monthlyBurnRate"], "45000.25");
        assert_eq!(company["monthlyRevenue"], "0");

        let (_, archived) = call(&app, Method::GET, "/api/deals?archived=true", None).await;
        assert_eq!(archived[0]["convertedCompanyId"], company["id"]);

        let (status, list) = call(&app, Method::GET, "/api/portfolio/companies", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (_, found) = call(&app, Method::GET, "/api/search?q=logi", None).await;
        let companies = found["companies"].as_array().unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0]["type"], "company");
        assert_eq!(companies[0]["description"], "Fintech • Series A");
        assert_eq!(companies[0]["url"], format!("/portfolio/{company_id}"));
        assert_eq!(found["deals"][0]["description"], "Fintech • closed");
    }

    #[tokio::test]
    async fn unknown_company_is_not_found() {
        let (app, _) = app().await;
        let (status, body) = call(&app, Method::GET, "/api/portfolio/companies/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Company not found");

        let (_, list) = call(&app, Method::GET, "/api/portfolio/companies", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }
}
