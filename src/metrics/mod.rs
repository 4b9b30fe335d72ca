//! Return metrics: IRR/NPV solver and forecast-level ratios

pub mod irr;
pub mod returns;

pub use irr::{irr, irr_with, npv, IrrConfig};
pub use returns::{evaluate, evaluate_with, investment_cash_flows, ReturnMetrics};
