use sea_orm_migration::prelude::*;

use crate::m20251018_000001_portfolio_company::PortfolioCompany;

#[derive(DeriveIden)]
enum Deal {
    Table,
    Id,
    CompanyName,
    Sector,
    Stage,
    RoundStage,
    RequestedAmountCents,
    ValuationCents,
    TeamScore,
    ProductScore,
    MarketScore,
    TractionScore,
    FounderName,
    FounderEmail,
    Notes,
    LossReason,
    ArchivedAt,
    ConvertedCompanyId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deal::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deal::CompanyName).string().not_null())
                    .col(ColumnDef::new(Deal::Sector).string().not_null())
                    .col(
                        ColumnDef::new(Deal::Stage)
                            .string_len(32)
                            .not_null()
                            .default("incoming"),
                    )
                    .col(
                        ColumnDef::new(Deal::RoundStage)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Deal::RequestedAmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Deal::ValuationCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(&mut score(Deal::TeamScore))
                    .col(&mut score(Deal::ProductScore))
                    .col(&mut score(Deal::MarketScore))
                    .col(&mut score(Deal::TractionScore))
                    .col(
                        ColumnDef::new(Deal::FounderName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Deal::FounderEmail)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Deal::Notes).text().not_null().default(""))
                    .col(ColumnDef::new(Deal::LossReason).string_len(32).null())
                    .col(
                        ColumnDef::new(Deal::ArchivedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Deal::ConvertedCompanyId).integer().null())
                    .col(
                        ColumnDef::new(Deal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deal::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_converted_company")
                            .from(Deal::Table, Deal::ConvertedCompanyId)
                            .to(PortfolioCompany::Table, PortfolioCompany::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_archived_at")
                    .table(Deal::Table)
                    .col(Deal::ArchivedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deal_stage")
                    .table(Deal::Table)
                    .col(Deal::Stage)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deal::Table).to_owned())
            .await
    }
}

fn score(column: Deal) -> ColumnDef {
    ColumnDef::new(column)
        .integer()
        .not_null()
        .default(0)
        .to_owned()
}
