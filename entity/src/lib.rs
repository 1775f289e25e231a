//! sea-orm entities backing the deal pipeline service.

pub mod deal;
pub mod portfolio_company;
