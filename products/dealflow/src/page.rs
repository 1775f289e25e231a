//! Deals page: loads both deal lists, owns them, and routes every board
//! interaction and dialog submission to the gateway.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    board::{self, Board, DropOutcome, PendingMove},
    deal::{Deal, DealId, NewDeal},
    error::{GatewayError, PageError, TransitionError, ValidationError},
    gateway::DealGateway,
    modals::{CloseChoice, Modal},
    stage::DealStage,
    transition::{self, Dispatched, TerminalPayload},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Active,
    History,
}

pub struct DealsPage {
    gateway: Arc<dyn DealGateway>,
    active: Vec<Deal>,
    archived: Vec<Deal>,
    board: Board,
    view: ViewMode,
    modal: Option<Modal>,
    error: Option<String>,
    form_error: Option<ValidationError>,
    redirect: Option<&'static str>,
    loading: bool,
}

impl DealsPage {
    pub fn new(gateway: Arc<dyn DealGateway>) -> Self {
        Self {
            gateway,
            active: Vec::new(),
            archived: Vec::new(),
            board: Board::default(),
            view: ViewMode::Active,
            modal: None,
            error: None,
            form_error: None,
            redirect: None,
            loading: false,
        }
    }

    /// Fetches active and archived deals together. Either failure leaves both lists as they were.
    pub async fn load(&mut self) -> Result<(), PageError> {
        self.loading = true;
        let gateway = self.gateway.as_ref();
        let result = futures::try_join!(gateway.list_deals(false), gateway.list_deals(true));
        self.loading = false;

        match result {
            Ok((active, archived)) => {
                info!(active = active.len(), archived = archived.len(), "deals loaded");
                self.active = active;
                self.archived = archived;
                self.board.sync(self.active.clone());
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load deals");
                self.record_gateway_error(&err);
                Err(err.into())
            }
        }
    }

    pub fn drag_start(&mut self, id: DealId) {
        self.board.drag_start(id);
    }

    pub fn drag_cancel(&mut self) {
        self.board.drag_cancel();
    }

    pub async fn drag_end(&mut self, target: Option<DealStage>) -> Result<DropOutcome, PageError> {
        let outcome = self.board.drop_on(target);
        self.route(outcome).await
    }

    /// Stage change outside of a drag, still gated by the interceptor.
    pub async fn request_stage_change(
        &mut self,
        id: DealId,
        to: DealStage,
    ) -> Result<DropOutcome, PageError> {
        let outcome = self.board.request(id, to);
        self.route(outcome).await
    }

    async fn route(&mut self, outcome: DropOutcome) -> Result<DropOutcome, PageError> {
        match &outcome {
            DropOutcome::NeedsModal { kind, deal } => {
                info!(deal_id = deal.id, modal = kind.name(), "opening archive dialog");
                self.modal = Some(Modal::open(*kind, deal.clone()));
            }
            DropOutcome::Dispatched(pending) => {
                let result = transition::dispatch(self.gateway.as_ref(), &pending.command).await;
                if let Err(err) = self.board.settle(pending, result) {
                    self.record_transition_error(&err);
                    return Err(err.into());
                }
                let command = &pending.command;
                if let Some(deal) = self.active.iter_mut().find(|d| d.id == command.deal_id) {
                    deal.stage = command.to.into();
                }
            }
            DropOutcome::Ignored | DropOutcome::Unchanged => {}
        }
        Ok(outcome)
    }

    pub async fn submit_close(&mut self, choice: CloseChoice) -> Result<Dispatched, PageError> {
        let payload = match &self.modal {
            Some(Modal::Convert(modal)) => choice.payload(&modal.form),
            _ => return Err(PageError::NoModal("convert-to-portfolio")),
        };
        self.finish_terminal(payload).await
    }

    pub async fn submit_loss(&mut self) -> Result<Dispatched, PageError> {
        let Some(Modal::Lose(modal)) = &mut self.modal else {
            return Err(PageError::NoModal("loss-reason"));
        };
        let reason = match modal.form.submit() {
            Ok(reason) => reason,
            Err(err) => {
                modal.error = Some(err.to_string());
                return Err(err.into());
            }
        };
        self.finish_terminal(TerminalPayload::Lose(reason)).await
    }

    async fn finish_terminal(&mut self, payload: TerminalPayload) -> Result<Dispatched, PageError> {
        let pending = match self.board.commit_terminal(payload) {
            Ok(pending) => pending,
            Err(err) => {
                self.fail_modal(err.to_string());
                return Err(err.into());
            }
        };
        if let Some(modal) = self.modal.as_mut() {
            modal.set_submitting(true);
            modal.set_error(None);
        }

        let result = transition::dispatch(self.gateway.as_ref(), &pending.command).await;
        match self.board.settle(&pending, result) {
            Ok(outcome) => {
                self.archive(&pending, &outcome);
                self.modal = None;
                Ok(outcome)
            }
            Err(err) => {
                if let TransitionError::Gateway(gateway_err) = &err {
                    self.note_redirect(gateway_err);
                }
                self.fail_modal(err.to_string());
                Err(err.into())
            }
        }
    }

    fn archive(&mut self, pending: &PendingMove, outcome: &Dispatched) {
        let id = pending.command.deal_id;
        let Some(index) = self.active.iter().position(|d| d.id == id) else {
            warn!(deal_id = id, "archived deal was no longer in the active list");
            return;
        };
        let deal = self.active.remove(index);
        if let Some(archived) = board::archived_copy(&deal, outcome, Utc::now()) {
            info!(deal_id = id, stage = %archived.stage, "deal archived");
            self.archived.insert(0, archived);
        }
        self.board.sync(self.active.clone());
    }

    fn fail_modal(&mut self, message: String) {
        if let Some(modal) = self.modal.as_mut() {
            modal.set_submitting(false);
            modal.set_error(Some(message));
        }
    }

    /// Dismisses the open dialog; the deal stays where it was.
    pub fn close_modal(&mut self) {
        self.modal = None;
        self.board.cancel_terminal();
    }

    /// Validates the add-deal form, creates the deal and puts it first in the active list.
    pub async fn create_deal(&mut self, form: &NewDeal) -> Result<Deal, PageError> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(err) => {
                self.form_error = Some(err.clone());
                return Err(err.into());
            }
        };
        self.form_error = None;
        match self.gateway.create_deal(&request).await {
            Ok(deal) => {
                info!(deal_id = deal.id, "deal created");
                self.add_created(deal.clone());
                Ok(deal)
            }
            Err(err) => {
                self.record_gateway_error(&err);
                Err(err.into())
            }
        }
    }

    /// Puts a deal the server already created at the front of the active list.
    pub fn add_created(&mut self, deal: Deal) {
        self.active.insert(0, deal);
        self.board.sync(self.active.clone());
    }

    fn record_gateway_error(&mut self, err: &GatewayError) {
        self.note_redirect(err);
        self.error = Some(err.to_string());
    }

    fn record_transition_error(&mut self, err: &TransitionError) {
        if let TransitionError::Gateway(gateway_err) = err {
            self.note_redirect(gateway_err);
        }
        self.error = Some(err.to_string());
    }

    fn note_redirect(&mut self, err: &GatewayError) {
        if let GatewayError::Unauthorized { redirect_to } = err {
            self.redirect = Some(*redirect_to);
        }
    }

    pub fn active(&self) -> &[Deal] {
        &self.active
    }

    /// Archived deals in server order, newest archive first.
    pub fn history(&self) -> &[Deal] {
        &self.archived
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view
    }

    pub fn set_view_mode(&mut self, view: ViewMode) {
        self.view = view;
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn form_error(&self) -> Option<&ValidationError> {
        self.form_error.as_ref()
    }

    /// Login route to navigate to after the session expired.
    pub fn redirect(&self) -> Option<&'static str> {
        self.redirect
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
