use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum PortfolioCompany {
    Table,
    Id,
    Name,
    Sector,
    RoundStage,
    AmountInvestedCents,
    CurrentValuationCents,
    CashRemainingCents,
    MonthlyBurnRateCents,
    MonthlyRevenueCents,
    InvestedAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PortfolioCompany::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortfolioCompany::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PortfolioCompany::Name).string().not_null())
                    .col(ColumnDef::new(PortfolioCompany::Sector).string().not_null())
                    .col(
                        ColumnDef::new(PortfolioCompany::RoundStage)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(&mut money(PortfolioCompany::AmountInvestedCents))
                    .col(&mut money(PortfolioCompany::CurrentValuationCents))
                    .col(&mut money(PortfolioCompany::CashRemainingCents))
                    .col(&mut money(PortfolioCompany::MonthlyBurnRateCents))
                    .col(&mut money(PortfolioCompany::MonthlyRevenueCents))
                    .col(
                        ColumnDef::new(PortfolioCompany::InvestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PortfolioCompany::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PortfolioCompany::Table).to_owned())
            .await
    }
}

fn money(column: PortfolioCompany) -> ColumnDef {
    ColumnDef::new(column)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}
