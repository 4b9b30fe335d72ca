//! Scenario analysis over amortization schedules

pub mod prepayment;
pub mod refinance;

pub use prepayment::{apply, apply_increased_payment, apply_lump_sum, PrepaymentResult, PrepaymentScenario};
pub use refinance::{analyze, break_even_months, RefinanceComparison};
