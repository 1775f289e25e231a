//! Kanban board state: the drag machine, the optimistic shadow list and rollback.
//!
//! The board never talks to the network on its own. A drop produces a
//! [`DropOutcome`]; when it carries a [`PendingMove`] the caller dispatches the
//! command and hands the result back through [`Board::settle`]. Several moves
//! may be pending at once; they all write to the same shadow list and the last
//! write wins.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, error, info_span};

use crate::{
    card::{CardView, ColumnView},
    deal::{Deal, DealId},
    error::TransitionError,
    gateway::DealGateway,
    stage::DealStage,
    transition::{self, Decision, Dispatched, ModalKind, StageCommand, TerminalPayload},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DealId),
}

/// A stage command whose optimistic effect is already visible on the board.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingMove {
    ticket: u64,
    pub command: StageCommand,
}

impl PendingMove {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DropOutcome {
    /// No drag was active, the drop landed outside a column, or the deal vanished.
    Ignored,
    /// Dropped on the column the deal is already in.
    Unchanged,
    /// Terminal target; the command is parked until the dialog completes.
    NeedsModal { kind: ModalKind, deal: Deal },
    /// Shadow list updated; the command must be dispatched and settled.
    Dispatched(PendingMove),
}

/// Deals of one stage in shadow-list order.
#[derive(Debug)]
pub struct Column<'a> {
    pub stage: DealStage,
    pub deals: Vec<&'a Deal>,
}

#[derive(Debug, Default)]
pub struct Board {
    source: Vec<Deal>,
    shadow: Vec<Deal>,
    drag: DragState,
    parked: Option<StageCommand>,
    next_ticket: u64,
}

impl Board {
    pub fn new(deals: Vec<Deal>) -> Self {
        Self {
            shadow: deals.clone(),
            source: deals,
            ..Self::default()
        }
    }

    /// Replaces both lists. In-flight optimistic edits are discarded.
    pub fn sync(&mut self, deals: Vec<Deal>) {
        if self.shadow != self.source {
            debug!("board resync discarded unsettled optimistic edits");
        }
        self.shadow = deals.clone();
        self.source = deals;
    }

    pub fn deals(&self) -> &[Deal] {
        &self.shadow
    }

    pub fn source(&self) -> &[Deal] {
        &self.source
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn parked(&self) -> Option<&StageCommand> {
        self.parked.as_ref()
    }

    pub fn drag_start(&mut self, id: DealId) {
        self.drag = DragState::Dragging(id);
    }

    pub fn drag_cancel(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Ends the current drag over `target`. Always leaves the board idle.
    pub fn drop_on(&mut self, target: Option<DealStage>) -> DropOutcome {
        let DragState::Dragging(id) = std::mem::take(&mut self.drag) else {
            return DropOutcome::Ignored;
        };
        match target {
            Some(to) => self.request(id, to),
            None => DropOutcome::Ignored,
        }
    }

    /// Routes a stage change for `id` through the interceptor without a drag.
    pub fn request(&mut self, id: DealId, to: DealStage) -> DropOutcome {
        let Some(deal) = self.shadow.iter().find(|d| d.id == id) else {
            return DropOutcome::Ignored;
        };
        if deal.stage.is(to) {
            return DropOutcome::Unchanged;
        }
        let command = StageCommand::new(id, deal.stage.clone(), to);
        match transition::decide(to) {
            Decision::Direct => DropOutcome::Dispatched(self.apply(command)),
            Decision::NeedsModal(kind) => {
                let deal = deal.clone();
                self.parked = Some(command);
                DropOutcome::NeedsModal { kind, deal }
            }
        }
    }

    /// Attaches the dialog payload to the parked terminal command and applies it.
    ///
    /// The command stays parked until a successful settle so a failed dialog
    /// submission can be retried.
    pub fn commit_terminal(
        &mut self,
        payload: TerminalPayload,
    ) -> Result<PendingMove, TransitionError> {
        let parked = self.parked.clone().ok_or(TransitionError::NothingPending)?;
        let command = parked.with_payload(payload)?;
        Ok(self.apply(command))
    }

    pub fn cancel_terminal(&mut self) -> Option<StageCommand> {
        self.parked.take()
    }

    /// Records the outcome of a dispatched move.
    ///
    /// Success folds the move into the source list. Failure replaces the
    /// shadow list with the source list and logs the error.
    pub fn settle<T, E: Display>(
        &mut self,
        pending: &PendingMove,
        result: Result<T, E>,
    ) -> Result<T, E> {
        let command = &pending.command;
        match &result {
            Ok(_) => {
                if let Some(deal) = self.source.iter_mut().find(|d| d.id == command.deal_id) {
                    deal.stage = command.to.into();
                }
                if command.extra.is_some()
                    && self.parked.as_ref().is_some_and(|p| p.deal_id == command.deal_id)
                {
                    self.parked = None;
                }
            }
            Err(err) => {
                error!(
                    ticket = pending.ticket,
                    deal_id = command.deal_id,
                    from = %command.from,
                    to = %command.to,
                    error = %err,
                    "stage change failed; reverting board"
                );
                self.shadow = self.source.clone();
            }
        }
        result
    }

    /// Drop plus dispatch plus settle for callers that can await inline.
    pub async fn drag_end<G>(
        &mut self,
        gateway: &G,
        target: Option<DealStage>,
    ) -> Result<DropOutcome, TransitionError>
    where
        G: DealGateway + ?Sized,
    {
        let outcome = self.drop_on(target);
        let DropOutcome::Dispatched(pending) = &outcome else {
            return Ok(outcome);
        };
        let span = info_span!(
            "dealflow.dragEnd",
            deal_id = pending.command.deal_id,
            to = pending.command.to.as_str(),
            ticket = pending.ticket
        );
        let result = transition::dispatch(gateway, &pending.command)
            .instrument(span)
            .await;
        self.settle(pending, result)?;
        Ok(outcome)
    }

    /// Partition of the shadow list by exact stage match, in column order.
    pub fn columns(&self) -> Vec<Column<'_>> {
        DealStage::ALL
            .into_iter()
            .map(|stage| Column {
                stage,
                deals: self.shadow.iter().filter(|d| d.stage.is(stage)).collect(),
            })
            .collect()
    }

    pub fn column_views(&self) -> Vec<ColumnView> {
        self.columns().iter().map(ColumnView::from).collect()
    }

    /// Card lifted under the pointer while a drag is active.
    pub fn overlay(&self) -> Option<CardView> {
        let DragState::Dragging(id) = self.drag else {
            return None;
        };
        self.shadow.iter().find(|d| d.id == id).map(CardView::from)
    }

    fn apply(&mut self, command: StageCommand) -> PendingMove {
        if let Some(deal) = self.shadow.iter_mut().find(|d| d.id == command.deal_id) {
            deal.stage = command.to.into();
        }
        self.next_ticket += 1;
        PendingMove {
            ticket: self.next_ticket,
            command,
        }
    }
}

/// Maps a dispatched result to the archived deal a page should record.
pub(crate) fn archived_copy(deal: &Deal, outcome: &Dispatched, at: DateTime<Utc>) -> Option<Deal> {
    match outcome {
        Dispatched::Moved(_) => None,
        Dispatched::Closed { company_id } => Some(deal.archived_as_closed(*company_id, at)),
        Dispatched::Lost(reason) => Some(deal.archived_as_lost(*reason, at)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::stage::StageKey;

    fn deal(id: DealId, stage: &str) -> Deal {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Deal {
            id,
            company_name: format!("Company {id}"),
            sector: "Fintech".into(),
            stage: serde_json::from_value(serde_json::Value::String(stage.into())).unwrap(),
            requested_amount: Decimal::new(1_000_000, 0),
            valuation: Decimal::new(5_000_000, 0),
            round_stage: "Seed".into(),
            team_score: 5,
            product_score: 5,
            market_score: 5,
            traction_score: 5,
            total_score: 20,
            founder_name: String::new(),
            founder_email: String::new(),
            notes: String::new(),
            loss_reason: None,
            archived_at: None,
            converted_company_id: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn every_known_stage_lands_in_exactly_one_column() {
        let stages = ["incoming", "screening", "due_diligence", "term_sheet", "closed", "lost"];
        let deals: Vec<_> = (1..=18).map(|i| deal(i, stages[i as usize % 6])).collect();
        let board = Board::new(deals.clone());

        let columns = board.columns();
        assert_eq!(columns.len(), 6);
        let total: usize = columns.iter().map(|c| c.deals.len()).sum();
        assert_eq!(total, deals.len());
        for d in &deals {
            let hits = columns
                .iter()
                .filter(|c| c.deals.iter().any(|x| x.id == d.id))
                .count();
            assert_eq!(hits, 1, "deal {} placed {hits} times", d.id);
        }
    }

    #[test]
    fn unknown_stage_is_silently_dropped() {
        let board = Board::new(vec![deal(1, "incoming"), deal(2, "archived_somehow")]);
        assert_eq!(board.deals()[1].stage, StageKey::Unknown("archived_somehow".into()));
        let total: usize = board.columns().iter().map(|c| c.deals.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn drop_without_drag_or_target_is_ignored() {
        let mut board = Board::new(vec![deal(1, "incoming")]);
        assert_eq!(board.drop_on(Some(DealStage::Screening)), DropOutcome::Ignored);

        board.drag_start(1);
        assert_eq!(board.drop_on(None), DropOutcome::Ignored);
        assert_eq!(board.drag_state(), DragState::Idle);
        assert_eq!(board.deals(), board.source());
    }

    #[test]
    fn same_column_drop_changes_nothing() {
        let mut board = Board::new(vec![deal(1, "screening")]);
        board.drag_start(1);
        assert_eq!(board.drop_on(Some(DealStage::Screening)), DropOutcome::Unchanged);
        assert_eq!(board.deals(), board.source());
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    #[test]
    fn failed_move_reverts_to_source() {
        let mut board = Board::new(vec![deal(1, "incoming"), deal(2, "screening")]);
        board.drag_start(1);
        let DropOutcome::Dispatched(pending) = board.drop_on(Some(DealStage::Screening)) else {
            panic!("expected dispatch");
        };
        assert!(board.deals()[0].stage.is(DealStage::Screening));

        let result: Result<(), &str> = board.settle(&pending, Err("boom"));
        assert!(result.is_err());
        assert!(board.deals()[0].stage.is(DealStage::Incoming));
        assert_eq!(board.deals(), board.source());
    }

    #[test]
    fn terminal_drop_parks_without_touching_shadow() {
        let mut board = Board::new(vec![deal(3, "term_sheet")]);
        board.drag_start(3);
        let outcome = board.drop_on(Some(DealStage::Lost));
        let DropOutcome::NeedsModal { kind, deal } = outcome else {
            panic!("expected modal");
        };
        assert_eq!(kind, ModalKind::Lose);
        assert_eq!(deal.id, 3);
        assert_eq!(board.deals(), board.source());
        assert_eq!(board.parked().map(|c| c.to), Some(DealStage::Lost));

        let err = board
            .commit_terminal(TerminalPayload::Close(crate::api::CloseDealRequest::skip()))
            .unwrap_err();
        assert!(matches!(err, TransitionError::PayloadMismatch { .. }));
        assert!(board.parked().is_some());

        let pending = board
            .commit_terminal(TerminalPayload::Lose(crate::stage::LossReason::Other))
            .unwrap();
        assert!(board.deals()[0].stage.is(DealStage::Lost));
        assert_eq!(pending.command.from, DealStage::TermSheet);

        let _ = board.settle(&pending, Err::<(), _>("rejected"));
        assert!(board.deals()[0].stage.is(DealStage::TermSheet));
        assert!(board.parked().is_some(), "kept for retry");

        let retry = board
            .commit_terminal(TerminalPayload::Lose(crate::stage::LossReason::Other))
            .unwrap();
        let _ = board.settle(&retry, Ok::<_, String>(()));
        assert!(board.parked().is_none());
    }

    #[test]
    fn overlapping_moves_share_the_shadow_list() {
        let mut board = Board::new(vec![deal(1, "incoming"), deal(2, "incoming")]);
        board.drag_start(1);
        let DropOutcome::Dispatched(first) = board.drop_on(Some(DealStage::Screening)) else {
            panic!("expected dispatch");
        };
        board.drag_start(2);
        let DropOutcome::Dispatched(second) = board.drop_on(Some(DealStage::TermSheet)) else {
            panic!("expected dispatch");
        };
        assert_ne!(first.ticket(), second.ticket());

        let _ = board.settle(&second, Ok::<_, String>(()));
        let _ = board.settle(&first, Err::<(), _>("timeout".to_string()));

        assert!(board.deals()[0].stage.is(DealStage::Incoming));
        assert!(board.deals()[1].stage.is(DealStage::TermSheet));
    }

    #[test]
    fn overlay_follows_the_dragged_card() {
        let mut board = Board::new(vec![deal(9, "incoming")]);
        assert!(board.overlay().is_none());
        board.drag_start(9);
        assert_eq!(board.overlay().map(|c| c.company_name), Some("Company 9".to_string()));
        board.drag_cancel();
        assert!(board.overlay().is_none());
    }
}
