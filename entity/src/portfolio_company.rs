use sea_orm::entity::prelude::*;

/// Company created when a closed deal is converted into a portfolio holding.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "portfolio_company")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub sector: String,
    pub round_stage: String,
    pub amount_invested_cents: i64,
    pub current_valuation_cents: i64,
    pub cash_remaining_cents: i64,
    pub monthly_burn_rate_cents: i64,
    pub monthly_revenue_cents: i64,
    pub invested_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deal::Entity")]
    Deal,
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
