//! Lump-sum and increased-payment prepayment scenarios
//!
//! Prepaid principal is recorded in [`PaymentRecord::extra_principal`] on the
//! payment it accompanies. The scheduled payment amount is kept, so
//! prepayments shorten the amortization instead of lowering the payment.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::mortgage::{generate, AmortizationSchedule, Amortizer, MortgageTerms};

/// A prepayment applied to an existing schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrepaymentScenario {
    /// One-off payment made together with payment `at_payment_number`
    LumpSum { amount: f64, at_payment_number: u32 },
    /// Fixed amount added to every payment from `from_payment_number` on
    IncreasedPayment {
        additional_amount: f64,
        from_payment_number: u32,
    },
}

/// Outcome of a prepayment scenario compared with the original schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentResult {
    pub schedule: AmortizationSchedule,
    pub interest_saved: f64,
    pub payments_eliminated: u32,
    pub payoff_accelerated: bool,
    /// Principal contributed on top of the scheduled payments
    pub extra_principal: f64,
}

impl PrepaymentResult {
    fn compare(original: &AmortizationSchedule, schedule: AmortizationSchedule) -> Self {
        let interest_saved = original.total_interest() - schedule.total_interest();
        let payments_eliminated = original.len().saturating_sub(schedule.len()) as u32;
        let payoff_accelerated =
            payments_eliminated > 0 || (schedule.is_paid_off() && !original.is_paid_off());
        let extra_principal = schedule.records.iter().map(|r| r.extra_principal).sum();

        Self {
            schedule,
            interest_saved,
            payments_eliminated,
            payoff_accelerated,
            extra_principal,
        }
    }
}

/// Run a scenario against the schedule generated from `terms`
pub fn apply(terms: &MortgageTerms, scenario: &PrepaymentScenario) -> Result<PrepaymentResult> {
    match *scenario {
        PrepaymentScenario::LumpSum {
            amount,
            at_payment_number,
        } => {
            let schedule = generate(terms)?;
            apply_lump_sum(terms, &schedule, amount, at_payment_number)
        }
        PrepaymentScenario::IncreasedPayment {
            additional_amount,
            from_payment_number,
        } => apply_increased_payment(terms, additional_amount, from_payment_number),
    }
}

/// Apply a lump sum alongside payment `at_payment_number` of `schedule`
///
/// The prefix up to that payment is kept and the rest is regenerated from the
/// reduced balance. A lump sum covering the whole balance ends the schedule
/// at that payment.
pub fn apply_lump_sum(
    terms: &MortgageTerms,
    schedule: &AmortizationSchedule,
    amount: f64,
    at_payment_number: u32,
) -> Result<PrepaymentResult> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(EngineError::invalid(
            "amount",
            format!("lump sum must be a non-negative amount, got {}", amount),
        ));
    }
    let record = schedule
        .get(at_payment_number)
        .ok_or(EngineError::InvalidPaymentNumber {
            requested: at_payment_number,
            len: schedule.len(),
        })?;

    let balance = record.remaining_balance;
    let new_balance = balance - amount;
    let mut prefix = schedule.records[..at_payment_number as usize].to_vec();

    if new_balance <= 0.0 {
        if let Some(last) = prefix.last_mut() {
            last.extra_principal += balance;
            last.remaining_balance = 0.0;
        }
        let result = PrepaymentResult {
            interest_saved: schedule.interest_after(at_payment_number),
            payments_eliminated: (schedule.len() - at_payment_number as usize) as u32,
            payoff_accelerated: schedule.len() > at_payment_number as usize || !schedule.is_paid_off(),
            extra_principal: balance,
            schedule: AmortizationSchedule {
                records: prefix,
                ..schedule.clone()
            },
        };
        log::debug!(
            "lump sum of {:.2} at payment {} retires the loan, saving {:.2}",
            amount,
            at_payment_number,
            result.interest_saved
        );
        return Ok(result);
    }

    if let Some(last) = prefix.last_mut() {
        last.extra_principal += amount;
        last.remaining_balance = new_balance;
    }

    let mut amortizer = Amortizer::from_terms(terms)?;
    amortizer.payment = schedule.payment;
    let continuation = amortizer.walk(new_balance, at_payment_number + 1, |_| 0.0);

    let original_suffix = &schedule.records[at_payment_number as usize..];
    let original_interest: f64 = original_suffix.iter().map(|r| r.interest_portion).sum();
    let new_interest: f64 = continuation.iter().map(|r| r.interest_portion).sum();
    let payments_eliminated = original_suffix.len().saturating_sub(continuation.len()) as u32;

    prefix.extend(continuation);
    let spliced = AmortizationSchedule {
        records: prefix,
        ..schedule.clone()
    };
    let payoff_accelerated =
        payments_eliminated > 0 || (spliced.is_paid_off() && !schedule.is_paid_off());

    Ok(PrepaymentResult {
        schedule: spliced,
        interest_saved: original_interest - new_interest,
        payments_eliminated,
        payoff_accelerated,
        extra_principal: amount,
    })
}

/// Add `additional_amount` to every payment from `from_payment_number` on
///
/// The schedule is re-walked period by period since every larger payment
/// changes the interest/principal split of the periods after it.
pub fn apply_increased_payment(
    terms: &MortgageTerms,
    additional_amount: f64,
    from_payment_number: u32,
) -> Result<PrepaymentResult> {
    if !additional_amount.is_finite() || additional_amount < 0.0 {
        return Err(EngineError::invalid(
            "additional_amount",
            format!("must be a non-negative amount, got {}", additional_amount),
        ));
    }

    let original = generate(terms)?;
    if original.is_empty() {
        return Ok(PrepaymentResult::compare(&original, original.clone()));
    }
    if from_payment_number == 0 || from_payment_number as usize > original.len() {
        return Err(EngineError::InvalidPaymentNumber {
            requested: from_payment_number,
            len: original.len(),
        });
    }

    let amortizer = Amortizer::from_terms(terms)?;
    let records = amortizer.walk(terms.original_amount, 1, |n| {
        if n >= from_payment_number {
            additional_amount
        } else {
            0.0
        }
    });
    let schedule = amortizer.into_schedule(terms.original_amount, records);
    let result = PrepaymentResult::compare(&original, schedule);

    log::debug!(
        "increased payment of {:.2} from payment {} saves {:.2} interest over {} payments",
        additional_amount,
        from_payment_number,
        result.interest_saved,
        result.payments_eliminated
    );

    Ok(result)
}
