#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use products_dealflow::{
    Deal, DealGateway, DealId, DealStage, GatewayError, LossReason,
    api::{CloseDealRequest, CloseDealResponse, CreateDealRequest, SearchHit, SearchResponse},
};
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    List { archived: bool },
    Create(String),
    UpdateStage(DealId, DealStage),
    Close(DealId, CloseDealRequest),
    Lose(DealId, LossReason),
    Search(String),
}

#[derive(Default)]
struct State {
    active: Vec<Deal>,
    archived: Vec<Deal>,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    unauthorized: bool,
    search_delays: HashMap<String, Duration>,
    next_id: DealId,
    next_company_id: i32,
}

/// In-memory stand-in for the deal API that records every call.
pub struct ScriptedGateway {
    state: Mutex<State>,
}

impl ScriptedGateway {
    pub fn new(active: Vec<Deal>, archived: Vec<Deal>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                active,
                archived,
                next_id: 100,
                next_company_id: 42,
                ..State::default()
            }),
        })
    }

    /// Makes `operation` fail with a 500 until [`Self::recover`] is called.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    pub fn expire_session(&self) {
        self.state.lock().unwrap().unauthorized = true;
    }

    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .search_delays
            .insert(query.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn stage_updates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::UpdateStage(..)))
            .count()
    }

    fn record(&self, call: Call, operation: &'static str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.unauthorized {
            return Err(GatewayError::Unauthorized {
                redirect_to: "/login",
            });
        }
        if state.failing.contains(operation) {
            return Err(GatewayError::status(operation, 500, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl DealGateway for ScriptedGateway {
    async fn list_deals(&self, archived: bool) -> Result<Vec<Deal>, GatewayError> {
        let operation = if archived { "list archived" } else { "list active" };
        self.record(Call::List { archived }, operation)?;
        let state = self.state.lock().unwrap();
        Ok(if archived {
            state.archived.clone()
        } else {
            state.active.clone()
        })
    }

    async fn create_deal(&self, request: &CreateDealRequest) -> Result<Deal, GatewayError> {
        self.record(Call::Create(request.company_name.clone()), "create")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut created = deal(state.next_id, &request.company_name, request.stage);
        created.sector = request.sector.clone();
        created.requested_amount = request.requested_amount;
        created.valuation = request.valuation;
        created.team_score = request.team_score;
        created.product_score = request.product_score;
        created.market_score = request.market_score;
        created.traction_score = request.traction_score;
        created.total_score = request.team_score
            + request.product_score
            + request.market_score
            + request.traction_score;
        state.active.insert(0, created.clone());
        Ok(created)
    }

    async fn update_stage(&self, id: DealId, stage: DealStage) -> Result<(), GatewayError> {
        self.record(Call::UpdateStage(id, stage), "update stage")
    }

    async fn close_deal(
        &self,
        id: DealId,
        request: &CloseDealRequest,
    ) -> Result<CloseDealResponse, GatewayError> {
        self.record(Call::Close(id, request.clone()), "close")?;
        let company_id = request
            .convert_to_portfolio
            .then(|| self.state.lock().unwrap().next_company_id);
        Ok(CloseDealResponse {
            company_id,
            message: "Deal closed".into(),
        })
    }

    async fn lose_deal(&self, id: DealId, reason: LossReason) -> Result<(), GatewayError> {
        self.record(Call::Lose(id, reason), "lose")
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, GatewayError> {
        self.record(Call::Search(query.to_string()), "search")?;
        let delay = self.state.lock().unwrap().search_delays.get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let needle = query.to_lowercase();
        let state = self.state.lock().unwrap();
        let deals = state
            .active
            .iter()
            .chain(state.archived.iter())
            .filter(|d| d.company_name.to_lowercase().contains(&needle))
            .map(|d| SearchHit {
                id: d.id,
                kind: "deal".into(),
                name: d.company_name.clone(),
                description: format!("{} • {}", d.sector, d.stage),
                url: "/deals".into(),
            })
            .collect();
        Ok(SearchResponse {
            deals,
            ..SearchResponse::default()
        })
    }
}

pub fn deal(id: DealId, name: &str, stage: DealStage) -> Deal {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    Deal {
        id,
        company_name: name.to_string(),
        sector: "Fintech".into(),
        stage: stage.into(),
        requested_amount: Decimal::new(2_000_000, 0),
        valuation: Decimal::new(10_000_000, 0),
        round_stage: "Seed".into(),
        team_score: 6,
        product_score: 6,
        market_score: 6,
        traction_score: 6,
        total_score: 24,
        founder_name: "Ada Founder".into(),
        founder_email: "ada@example.com".into(),
        notes: String::new(),
        loss_reason: None,
        archived_at: None,
        converted_company_id: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn archived(id: DealId, name: &str, stage: DealStage, day: u32) -> Deal {
    let mut d = deal(id, name, stage);
    d.archived_at = Some(Utc.with_ymd_and_hms(2025, 4, day, 12, 0, 0).unwrap());
    d
}
