//! Conversion of nominal annual rates to per-payment effective rates

use super::terms::{PaymentFrequency, RateType};

/// Effective annual rate implied by a nominal rate and its compounding
pub fn effective_annual_rate(annual_rate: f64, rate_type: RateType) -> f64 {
    match rate_type {
        RateType::Fixed => (1.0 + annual_rate / 2.0).powi(2) - 1.0,
        RateType::Variable => (1.0 + annual_rate / 12.0).powi(12) - 1.0,
    }
}

/// Effective interest rate for one payment period
///
/// Fixed rates compound semi-annually and are converted through the effective
/// annual rate. Variable rates compound monthly and are rescaled from the
/// monthly rate with a `12 / periods_per_year` exponent.
pub fn periodic_rate(annual_rate: f64, rate_type: RateType, frequency: PaymentFrequency) -> f64 {
    let periods = frequency.periods_per_year() as f64;
    match rate_type {
        RateType::Fixed => {
            let effective_annual = effective_annual_rate(annual_rate, RateType::Fixed);
            (1.0 + effective_annual).powf(1.0 / periods) - 1.0
        }
        RateType::Variable => {
            let monthly = annual_rate / 12.0;
            (1.0 + monthly).powf(12.0 / periods) - 1.0
        }
    }
}
