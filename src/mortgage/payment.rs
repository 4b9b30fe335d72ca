//! Periodic payment sizing

use super::rates::periodic_rate;
use super::terms::{MortgageTerms, PaymentFrequency, RateType};
use crate::error::{EngineError, Result};

/// Round to whole cents, halves rounding up
///
/// The small bias absorbs binary representation error so that values such as
/// 1.005 (stored as 1.00499999...) still round up. Only defined for
/// non-negative amounts.
pub fn round_to_cents(amount: f64) -> f64 {
    debug_assert!(amount >= 0.0, "round_to_cents called with {}", amount);
    ((amount * 100.0) + 0.5 + 1e-7).floor() / 100.0
}

/// Level payment retiring `principal` over `periods` at `rate` per period
pub fn annuity_payment(principal: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return principal;
    }
    let n = periods as f64;
    if rate == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + rate).powf(n);
    principal * rate * growth / (growth - 1.0)
}

/// Payment per period for the given frequency, rounded to cents
///
/// The monthly annuity payment is always derived first. Semi-monthly and the
/// accelerated frequencies divide it (by 2, 2 and 4); regular bi-weekly and
/// weekly payments are re-derived as annuities at their own periodic rate over
/// the equivalent number of periods.
pub fn payment_amount(
    principal: f64,
    annual_rate: f64,
    rate_type: RateType,
    amortization_months: u32,
    frequency: PaymentFrequency,
) -> Result<f64> {
    if !principal.is_finite() || principal < 0.0 {
        return Err(EngineError::invalid(
            "principal",
            format!("must be a non-negative amount, got {}", principal),
        ));
    }
    if amortization_months == 0 {
        return Err(EngineError::invalid("amortization_months", "must be at least one month"));
    }
    if principal == 0.0 {
        return Ok(0.0);
    }

    let monthly_rate = periodic_rate(annual_rate, rate_type, PaymentFrequency::Monthly);
    let monthly = annuity_payment(principal, monthly_rate, amortization_months);

    let payment = match frequency {
        PaymentFrequency::Monthly => monthly,
        PaymentFrequency::SemiMonthly | PaymentFrequency::AcceleratedBiWeekly => monthly / 2.0,
        PaymentFrequency::AcceleratedWeekly => monthly / 4.0,
        PaymentFrequency::BiWeekly | PaymentFrequency::Weekly => {
            let rate = periodic_rate(annual_rate, rate_type, frequency);
            annuity_payment(principal, rate, frequency.payments_in_months(amortization_months))
        }
    };

    Ok(round_to_cents(payment))
}

/// Scheduled payment for a set of terms
pub fn payment_for_terms(terms: &MortgageTerms) -> Result<f64> {
    payment_amount(
        terms.original_amount.max(0.0),
        terms.annual_interest_rate,
        terms.rate_type,
        terms.amortization_months,
        terms.payment_frequency,
    )
}

/// Payment expressed per month, for comparing loans on different frequencies
pub fn monthly_equivalent(payment: f64, frequency: PaymentFrequency) -> f64 {
    payment * frequency.periods_per_year() as f64 / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_to_cents(1.005), 1.01);
        assert_eq!(round_to_cents(872.405), 872.41);
        assert_eq!(round_to_cents(1735.577242), 1735.58);
        assert_eq!(round_to_cents(2.004), 2.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "round_to_cents")]
    fn test_round_rejects_negative_amounts() {
        round_to_cents(-1.005);
    }

    #[test]
    fn test_monthly_payment_semi_annual_compounding() {
        let payment = payment_amount(440_000.0, 0.025, RateType::Fixed, 360, PaymentFrequency::Monthly).unwrap();
        assert_eq!(payment, 1735.58);

        let payment = payment_amount(300_000.0, 0.05, RateType::Fixed, 300, PaymentFrequency::Monthly).unwrap();
        assert_eq!(payment, 1744.81);
    }

    #[test]
    fn test_divided_versus_rederived_payments() {
        let pay = |frequency| payment_amount(300_000.0, 0.05, RateType::Fixed, 300, frequency).unwrap();
        let monthly_exact = 1744.8100;

        assert_abs_diff_eq!(pay(PaymentFrequency::SemiMonthly), 872.41, epsilon = 0.011);
        assert_abs_diff_eq!(pay(PaymentFrequency::AcceleratedBiWeekly), 872.41, epsilon = 0.011);
        assert_abs_diff_eq!(pay(PaymentFrequency::AcceleratedWeekly), monthly_exact / 4.0, epsilon = 0.011);

        // The regular bi-weekly annuity is lower than half the monthly payment
        assert_eq!(pay(PaymentFrequency::BiWeekly), 804.41);
        assert!(pay(PaymentFrequency::BiWeekly) < pay(PaymentFrequency::AcceleratedBiWeekly));
        assert!(pay(PaymentFrequency::Weekly) < pay(PaymentFrequency::AcceleratedWeekly));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let monthly = payment_amount(120_000.0, 0.0, RateType::Variable, 240, PaymentFrequency::Monthly).unwrap();
        assert_eq!(monthly, 500.0);

        let weekly = payment_amount(120_000.0, 0.0, RateType::Variable, 240, PaymentFrequency::Weekly).unwrap();
        assert_eq!(weekly, round_to_cents(120_000.0 / 1040.0));
    }

    #[test]
    fn test_rejects_negative_principal() {
        assert!(payment_amount(-1.0, 0.05, RateType::Fixed, 300, PaymentFrequency::Monthly).is_err());
        assert_eq!(
            payment_amount(0.0, 0.05, RateType::Fixed, 300, PaymentFrequency::Monthly).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_monthly_equivalent() {
        assert_abs_diff_eq!(monthly_equivalent(500.0, PaymentFrequency::BiWeekly), 1083.333, epsilon = 0.001);
        assert_eq!(monthly_equivalent(1000.0, PaymentFrequency::Monthly), 1000.0);
    }
}
