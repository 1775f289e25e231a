use async_trait::async_trait;

use crate::{
    api::{CloseDealRequest, CloseDealResponse, CreateDealRequest, SearchResponse},
    deal::{Deal, DealId},
    error::GatewayError,
    stage::{DealStage, LossReason},
};

/// External deal API consumed by the board and the deals page.
#[async_trait]
pub trait DealGateway: Send + Sync {
    /// Active deals when `archived` is false, archived deals (newest archive first) otherwise.
    async fn list_deals(&self, archived: bool) -> Result<Vec<Deal>, GatewayError>;

    async fn create_deal(&self, request: &CreateDealRequest) -> Result<Deal, GatewayError>;

    /// Non-terminal stage changes only.
    async fn update_stage(&self, id: DealId, stage: DealStage) -> Result<(), GatewayError>;

    async fn close_deal(
        &self,
        id: DealId,
        request: &CloseDealRequest,
    ) -> Result<CloseDealResponse, GatewayError>;

    async fn lose_deal(&self, id: DealId, reason: LossReason) -> Result<(), GatewayError>;

    async fn search(&self, query: &str) -> Result<SearchResponse, GatewayError>;
}
