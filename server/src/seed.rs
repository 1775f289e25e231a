//! Demo pipeline for local development.

use anyhow::Result;
use chrono::Utc;
use entity::deal::{self, Stage};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use tracing::info;

use platform_db::DbPool;

struct DemoDeal {
    company: &'static str,
    sector: &'static str,
    stage: Stage,
    round: &'static str,
    requested: i64,
    valuation: i64,
    scores: [i32; 4],
    founder: &'static str,
    email: &'static str,
    notes: &'static str,
}

const DEMO_DEALS: &[DemoDeal] = &[
    DemoDeal {
        company: "TechFlow AI",
        sector: "AI/ML",
        stage: Stage::Incoming,
        round: "Seed",
        requested: 2_000_000,
        valuation: 10_000_000,
        scores: [8, 7, 9, 6],
        founder: "Sarah Chen",
        email: "sarah@techflow.ai",
        notes: "Strong AI team from Google. Working on enterprise automation.",
    },
    DemoDeal {
        company: "GreenEnergy Solutions",
        sector: "CleanTech",
        stage: Stage::Incoming,
        round: "Pre-Seed",
        requested: 1_500_000,
        valuation: 6_000_000,
        scores: [7, 8, 8, 5],
        founder: "Michael Green",
        email: "michael@greenenergy.io",
        notes: "Novel solar panel technology. Patent pending.",
    },
    DemoDeal {
        company: "FinanceBot",
        sector: "Fintech",
        stage: Stage::Screening,
        round: "Series A",
        requested: 3_000_000,
        valuation: 15_000_000,
        scores: [9, 8, 7, 8],
        founder: "David Kim",
        email: "david@financebot.com",
        notes: "B2B payment automation. 50K MRR already.",
    },
    DemoDeal {
        company: "HealthTrack Pro",
        sector: "HealthTech",
        stage: Stage::Screening,
        round: "Seed",
        requested: 1_000_000,
        valuation: 5_000_000,
        scores: [7, 9, 8, 6],
        founder: "Dr. Emily Watson",
        email: "emily@healthtrack.pro",
        notes: "FDA-cleared wearable device. Strong clinical validation.",
    },
    DemoDeal {
        company: "CloudSecurity Inc",
        sector: "Cybersecurity",
        stage: Stage::DueDiligence,
        round: "Series A",
        requested: 5_000_000,
        valuation: 25_000_000,
        scores: [9, 9, 9, 7],
        founder: "Alex Rodriguez",
        email: "alex@cloudsec.io",
        notes: "Zero-trust security platform. Fortune 500 clients.",
    },
    DemoDeal {
        company: "EduLearn Platform",
        sector: "EdTech",
        stage: Stage::DueDiligence,
        round: "Seed",
        requested: 2_500_000,
        valuation: 12_000_000,
        scores: [8, 8, 7, 8],
        founder: "Jennifer Liu",
        email: "jen@edulearn.com",
        notes: "AI tutoring platform. 100K active students.",
    },
    DemoDeal {
        company: "LogiChain",
        sector: "Supply Chain",
        stage: Stage::TermSheet,
        round: "Series A",
        requested: 4_000_000,
        valuation: 20_000_000,
        scores: [8, 9, 8, 9],
        founder: "Robert Park",
        email: "robert@logichain.io",
        notes: "Blockchain-based supply chain visibility. $2M ARR.",
    },
];

/// Inserts the demo deals unless the pipeline already has rows. Returns the insert count.
pub async fn seed_demo_deals(pool: &DbPool) -> Result<usize> {
    let existing = deal::Entity::find().count(pool).await?;
    if existing > 0 {
        info!(existing, "deals present; skipping seed");
        return Ok(0);
    }

    let now = Utc::now();
    for demo in DEMO_DEALS {
        let [team, product, market, traction] = demo.scores;
        deal::ActiveModel {
            company_name: Set(demo.company.to_string()),
            sector: Set(demo.sector.to_string()),
            stage: Set(demo.stage),
            round_stage: Set(demo.round.to_string()),
            requested_amount_cents: Set(demo.requested * 100),
            valuation_cents: Set(demo.valuation * 100),
            team_score: Set(team),
            product_score: Set(product),
            market_score: Set(market),
            traction_score: Set(traction),
            founder_name: Set(demo.founder.to_string()),
            founder_email: Set(demo.email.to_string()),
            notes: Set(demo.notes.to_string()),
            loss_reason: Set(None),
            archived_at: Set(None),
            converted_company_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(pool)
        .await?;
        info!(company = demo.company, stage = ?demo.stage, "seeded deal");
    }
    Ok(DEMO_DEALS.len())
}

#[cfg(test)]
mod tests {
    use migration::{Migrator, MigratorTrait};
    use platform_db::{DatabaseSettings, connect};

    use super::*;

    #[tokio::test]
    async fn seeds_once() {
        let pool = connect(&DatabaseSettings::sqlite_memory()).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();

        assert_eq!(seed_demo_deals(&pool).await.unwrap(), DEMO_DEALS.len());
        assert_eq!(seed_demo_deals(&pool).await.unwrap(), 0);

        let rows = deal::Entity::find().all(&pool).await.unwrap();
        assert_eq!(rows.len(), 7);
        let logichain = rows.iter().find(|d| d.company_name == "LogiChain").unwrap();
        assert_eq!(logichain.total_score(), 34);
        assert_eq!(logichain.requested_amount_cents, 400_000_000);
    }
}
