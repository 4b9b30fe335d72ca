//! Current-versus-new mortgage comparison

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::mortgage::{generate, monthly_equivalent, AmortizationSchedule, Amortizer, MortgageTerms};

/// Side-by-side view of staying with the current lender or refinancing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceComparison {
    pub current_schedule: AmortizationSchedule,
    pub new_schedule: AmortizationSchedule,

    /// Payments normalized to a monthly amount so frequencies compare
    pub current_monthly_payment: f64,
    pub new_monthly_payment: f64,
    pub monthly_savings: f64,

    pub current_total_payments: f64,
    pub new_total_payments: f64,
    pub current_total_interest: f64,
    pub new_total_interest: f64,
    pub interest_savings: f64,

    /// Current schedule length minus new schedule length
    pub payment_count_difference: i64,

    pub refinancing_cost: f64,
    /// Interest savings net of the refinancing cost
    pub net_savings: f64,

    /// Months of savings needed to recover the cost; `None` when the new loan
    /// never pays for itself
    pub break_even_months: Option<u32>,
}

impl RefinanceComparison {
    pub fn is_worthwhile(&self) -> bool {
        self.break_even_months.is_some() && self.net_savings > 0.0
    }
}

/// Months of `monthly_savings` needed to recover `cost`
pub fn break_even_months(cost: f64, monthly_savings: f64) -> Option<u32> {
    if monthly_savings <= 0.0 {
        return None;
    }
    Some((cost / monthly_savings).ceil().max(0.0) as u32)
}

/// Remaining schedule of the current loan: the payment agreed under
/// `current_terms`, walked from the outstanding balance for one term
fn continue_current(current_terms: &MortgageTerms, balance: f64) -> Result<AmortizationSchedule> {
    current_terms.validate()?;

    let mut amortizer = Amortizer::from_terms(current_terms)?;
    // The existing payment retires the balance on its own; no forced payoff
    amortizer.final_payment = u32::MAX;
    let records = if balance > 0.0 {
        amortizer.walk(balance, 1, |_| 0.0)
    } else {
        Vec::new()
    };
    Ok(amortizer.into_schedule(balance, records))
}

/// Compare continuing `current_terms` on the outstanding balance with taking
/// out `new_terms`
///
/// The current loan keeps its scheduled payment; only the new loan is sized
/// afresh.
pub fn analyze(
    current_terms: &MortgageTerms,
    current_remaining_balance: f64,
    new_terms: &MortgageTerms,
    refinancing_cost: f64,
) -> Result<RefinanceComparison> {
    if !current_remaining_balance.is_finite() || current_remaining_balance < 0.0 {
        return Err(EngineError::invalid(
            "current_remaining_balance",
            format!("must be a non-negative amount, got {}", current_remaining_balance),
        ));
    }
    if !refinancing_cost.is_finite() || refinancing_cost < 0.0 {
        return Err(EngineError::invalid(
            "refinancing_cost",
            format!("must be a non-negative amount, got {}", refinancing_cost),
        ));
    }

    let current_schedule = continue_current(current_terms, current_remaining_balance)?;
    let new_schedule = generate(new_terms)?;

    let current_monthly_payment = monthly_equivalent(current_schedule.payment, current_terms.payment_frequency);
    let new_monthly_payment = monthly_equivalent(new_schedule.payment, new_terms.payment_frequency);
    let monthly_savings = current_monthly_payment - new_monthly_payment;

    let current_total_interest = current_schedule.total_interest();
    let new_total_interest = new_schedule.total_interest();
    let interest_savings = current_total_interest - new_total_interest;

    let comparison = RefinanceComparison {
        current_monthly_payment,
        new_monthly_payment,
        monthly_savings,
        current_total_payments: current_schedule.total_paid(),
        new_total_payments: new_schedule.total_paid(),
        current_total_interest,
        new_total_interest,
        interest_savings,
        payment_count_difference: current_schedule.len() as i64 - new_schedule.len() as i64,
        refinancing_cost,
        net_savings: interest_savings - refinancing_cost,
        break_even_months: break_even_months(refinancing_cost, monthly_savings),
        current_schedule,
        new_schedule,
    };

    log::debug!(
        "refinance saves {:.2}/month, break-even {:?} months",
        comparison.monthly_savings,
        comparison.break_even_months
    );

    Ok(comparison)
}
