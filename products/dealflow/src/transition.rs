//! Stage-transition decisions and the single command every move goes through.

use tracing::debug;

use crate::{
    api::CloseDealRequest,
    deal::{CompanyId, DealId},
    error::TransitionError,
    gateway::DealGateway,
    stage::{DealStage, LossReason, StageKey},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModalKind {
    /// Convert-to-portfolio flow, opened for moves to `closed`.
    Close,
    /// Loss-reason flow, opened for moves to `lost`.
    Lose,
}

impl ModalKind {
    pub fn stage(self) -> DealStage {
        match self {
            ModalKind::Close => DealStage::Closed,
            ModalKind::Lose => DealStage::Lost,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModalKind::Close => "convert-to-portfolio",
            ModalKind::Lose => "loss-reason",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Direct,
    NeedsModal(ModalKind),
}

/// Whether a move to `to` can be sent right away or needs extra input first.
pub fn decide(to: DealStage) -> Decision {
    match to {
        DealStage::Closed => Decision::NeedsModal(ModalKind::Close),
        DealStage::Lost => Decision::NeedsModal(ModalKind::Lose),
        DealStage::Incoming
        | DealStage::Screening
        | DealStage::DueDiligence
        | DealStage::TermSheet => Decision::Direct,
    }
}

/// Extra input collected by the archive dialogs.
#[derive(Clone, Debug, PartialEq)]
pub enum TerminalPayload {
    Close(CloseDealRequest),
    Lose(LossReason),
}

impl TerminalPayload {
    pub fn stage(&self) -> DealStage {
        match self {
            TerminalPayload::Close(_) => DealStage::Closed,
            TerminalPayload::Lose(_) => DealStage::Lost,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageCommand {
    pub deal_id: DealId,
    pub from: StageKey,
    pub to: DealStage,
    pub extra: Option<TerminalPayload>,
}

impl StageCommand {
    pub fn new(deal_id: DealId, from: StageKey, to: DealStage) -> Self {
        Self {
            deal_id,
            from,
            to,
            extra: None,
        }
    }

    pub fn with_payload(mut self, payload: TerminalPayload) -> Result<Self, TransitionError> {
        if payload.stage() != self.to {
            return Err(TransitionError::PayloadMismatch { to: self.to });
        }
        self.extra = Some(payload);
        Ok(self)
    }
}

/// What the external system confirmed for a dispatched command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatched {
    Moved(DealStage),
    Closed { company_id: Option<CompanyId> },
    Lost(LossReason),
}

/// Issues exactly one external call for `command`.
pub async fn dispatch<G>(gateway: &G, command: &StageCommand) -> Result<Dispatched, TransitionError>
where
    G: DealGateway + ?Sized,
{
    debug!(
        deal_id = command.deal_id,
        from = %command.from,
        to = %command.to,
        "dispatching stage command"
    );
    match (decide(command.to), &command.extra) {
        (Decision::Direct, None) => {
            gateway.update_stage(command.deal_id, command.to).await?;
            Ok(Dispatched::Moved(command.to))
        }
        (Decision::Direct, Some(_)) => Err(TransitionError::PayloadMismatch { to: command.to }),
        (Decision::NeedsModal(_), None) => Err(TransitionError::MissingPayload { to: command.to }),
        (Decision::NeedsModal(ModalKind::Close), Some(TerminalPayload::Close(request))) => {
            let response = gateway.close_deal(command.deal_id, request).await?;
            Ok(Dispatched::Closed {
                company_id: response.company_id,
            })
        }
        (Decision::NeedsModal(ModalKind::Lose), Some(TerminalPayload::Lose(reason))) => {
            gateway.lose_deal(command.deal_id, *reason).await?;
            Ok(Dispatched::Lost(*reason))
        }
        (Decision::NeedsModal(_), Some(_)) => {
            Err(TransitionError::PayloadMismatch { to: command.to })
        }
    }
}
