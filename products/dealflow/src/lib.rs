//! Deal pipeline client: stage model, kanban board coordinator, archive dialogs,
//! the deals page orchestrator and the HTTP gateway they talk through.

pub mod api;
pub mod board;
pub mod card;
pub mod client;
pub mod deal;
pub mod error;
pub mod gateway;
pub mod modals;
pub mod page;
pub mod search;
pub mod settings;
pub mod stage;
pub mod transition;

pub use board::{Board, DropOutcome, PendingMove};
pub use client::{ClientConfig, HttpGateway};
pub use deal::{Deal, DealId, DealScores, NewDeal};
pub use error::{GatewayError, PageError, TransitionError, ValidationError};
pub use gateway::DealGateway;
pub use page::{DealsPage, ViewMode};
pub use stage::{DealStage, LossReason, StageKey};
pub use transition::{Decision, ModalKind, StageCommand, TerminalPayload, decide, dispatch};
