//! Archive dialogs shown for moves to `closed` and `lost`.
//!
//! Both dialogs are keyed on the single pending deal held by the page, so at
//! most one is open at a time.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::{
    api::CloseDealRequest,
    deal::Deal,
    error::ValidationError,
    stage::LossReason,
    transition::{ModalKind, TerminalPayload},
};

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)").expect("number pattern compiles"));

/// Leading numeric prefix of `raw`, or zero when there is none.
fn lenient_amount(raw: &str) -> Decimal {
    LEADING_NUMBER
        .find(raw.trim())
        .and_then(|m| Decimal::from_str(m.as_str().trim_end_matches('.')).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Optional portfolio figures collected when closing a deal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertForm {
    pub cash_remaining: String,
    pub monthly_burn_rate: String,
    pub monthly_revenue: String,
}

impl ConvertForm {
    /// Close without creating a portfolio company.
    pub fn skip_request(&self) -> CloseDealRequest {
        CloseDealRequest::skip()
    }

    pub fn convert_request(&self) -> CloseDealRequest {
        CloseDealRequest {
            convert_to_portfolio: true,
            cash_remaining: Some(lenient_amount(&self.cash_remaining)),
            monthly_burn_rate: Some(lenient_amount(&self.monthly_burn_rate)),
            monthly_revenue: Some(lenient_amount(&self.monthly_revenue)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LossForm {
    selected: Option<LossReason>,
}

impl LossForm {
    pub fn select(&mut self, reason: LossReason) {
        self.selected = Some(reason);
    }

    pub fn selected(&self) -> Option<LossReason> {
        self.selected
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some()
    }

    pub fn submit(&self) -> Result<LossReason, ValidationError> {
        self.selected.ok_or(ValidationError::MissingLossReason)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConvertModal {
    pub deal: Deal,
    pub form: ConvertForm,
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LossModal {
    pub deal: Deal,
    pub form: LossForm,
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Modal {
    Convert(ConvertModal),
    Lose(LossModal),
}

impl Modal {
    pub fn open(kind: ModalKind, deal: Deal) -> Self {
        match kind {
            ModalKind::Close => Modal::Convert(ConvertModal {
                deal,
                form: ConvertForm::default(),
                error: None,
                submitting: false,
            }),
            ModalKind::Lose => Modal::Lose(LossModal {
                deal,
                form: LossForm::default(),
                error: None,
                submitting: false,
            }),
        }
    }

    pub fn kind(&self) -> ModalKind {
        match self {
            Modal::Convert(_) => ModalKind::Close,
            Modal::Lose(_) => ModalKind::Lose,
        }
    }

    pub fn deal(&self) -> &Deal {
        match self {
            Modal::Convert(m) => &m.deal,
            Modal::Lose(m) => &m.deal,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Modal::Convert(m) => m.error.as_deref(),
            Modal::Lose(m) => m.error.as_deref(),
        }
    }

    pub fn set_error(&mut self, message: Option<String>) {
        match self {
            Modal::Convert(m) => m.error = message,
            Modal::Lose(m) => m.error = message,
        }
    }

    pub fn is_submitting(&self) -> bool {
        match self {
            Modal::Convert(m) => m.submitting,
            Modal::Lose(m) => m.submitting,
        }
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        match self {
            Modal::Convert(m) => m.submitting = submitting,
            Modal::Lose(m) => m.submitting = submitting,
        }
    }
}

/// Which close action the operator picked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CloseChoice {
    Skip,
    Convert,
}

impl CloseChoice {
    pub fn payload(self, form: &ConvertForm) -> TerminalPayload {
        TerminalPayload::Close(match self {
            CloseChoice::Skip => form.skip_request(),
            CloseChoice::Convert => form.convert_request(),
        })
    }
}
