use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "deal")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_name: String,
    pub sector: String,
    pub stage: Stage,
    pub round_stage: String,
    pub requested_amount_cents: i64,
    pub valuation_cents: i64,
    pub team_score: i32,
    pub product_score: i32,
    pub market_score: i32,
    pub traction_score: i32,
    pub founder_name: String,
    pub founder_email: String,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub loss_reason: Option<LossReason>,
    #[sea_orm(indexed)]
    pub archived_at: Option<DateTimeUtc>,
    pub converted_company_id: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn total_score(&self) -> i32 {
        self.team_score + self.product_score + self.market_score + self.traction_score
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portfolio_company::Entity",
        from = "Column::ConvertedCompanyId",
        to = "super::portfolio_company::Column::Id",
        on_delete = "SetNull"
    )]
    ConvertedCompany,
}

impl Related<super::portfolio_company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConvertedCompany.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Stage {
    #[sea_orm(string_value = "incoming")]
    Incoming,
    #[sea_orm(string_value = "screening")]
    Screening,
    #[sea_orm(string_value = "due_diligence")]
    DueDiligence,
    #[sea_orm(string_value = "term_sheet")]
    TermSheet,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "lost")]
    Lost,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum LossReason {
    #[sea_orm(string_value = "passed")]
    Passed,
    #[sea_orm(string_value = "valuation_too_high")]
    ValuationTooHigh,
    #[sea_orm(string_value = "competitor_won")]
    CompetitorWon,
    #[sea_orm(string_value = "founder_declined")]
    FounderDeclined,
    #[sea_orm(string_value = "deal_fell_through")]
    DealFellThrough,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ActiveModelBehavior for ActiveModel {}
