pub use sea_orm_migration::prelude::*;

mod m20251018_000001_portfolio_company;
mod m20251018_000002_deal;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251018_000001_portfolio_company::Migration),
            Box::new(m20251018_000002_deal::Migration),
        ]
    }
}
