//! Internal Rate of Return (IRR) and Net Present Value (NPV)
//!
//! Rates are per period of the cash-flow series (annual for forecasts) and
//! expressed as decimals.

use serde::{Deserialize, Serialize};

/// Cash flows smaller than this are treated as zero when looking for a sign
/// change
const ZERO_FLOW: f64 = 1e-10;

/// Derivative magnitude below which Newton's step is abandoned
const FLAT_DERIVATIVE: f64 = 1e-20;

/// Largest NPV accepted at a converged Newton rate
const ROOT_RESIDUAL: f64 = 1e-6;

/// Solver settings for [`irr_with`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrConfig {
    /// Newton-Raphson starting rate
    pub initial_guess: f64,

    /// Iteration cap for each of the two solver stages
    pub max_iterations: usize,

    pub tolerance: f64,

    /// Bisection bracket, also used to clamp Newton steps
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.10,
            max_iterations: 1000,
            tolerance: 1e-10,
            lower_bound: -0.99,
            upper_bound: 10.0,
        }
    }
}

/// Net present value of `cash_flows` at `rate`, with `cash_flows[0]`
/// undiscounted
pub fn npv(cash_flows: &[f64], rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// NPV and its derivative with respect to rate
fn npv_and_derivative(cash_flows: &[f64], rate: f64) -> (f64, f64) {
    cash_flows
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(value, slope), (t, &cf)| {
            let discount = (1.0 + rate).powi(t as i32);
            let value = value + cf / discount;
            let slope = if t > 0 {
                slope - t as f64 * cf / (discount * (1.0 + rate))
            } else {
                slope
            };
            (value, slope)
        })
}

/// Rate at which the NPV of `cash_flows` is zero, with default settings
///
/// Returns `None` when the series has no sign change or no root lies within
/// the bracket.
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    irr_with(cash_flows, &IrrConfig::default())
}

/// IRR using Newton-Raphson, falling back to bisection
pub fn irr_with(cash_flows: &[f64], config: &IrrConfig) -> Option<f64> {
    let first = *cash_flows.first()?;
    if first >= 0.0 {
        log::warn!("first cash flow {:.2} is not an outflow; solving anyway", first);
    }

    let has_positive = cash_flows.iter().any(|&cf| cf > ZERO_FLOW);
    let has_negative = cash_flows.iter().any(|&cf| cf < -ZERO_FLOW);
    if !has_positive || !has_negative {
        log::debug!("no sign change across {} cash flows; IRR undefined", cash_flows.len());
        return None;
    }

    newton(cash_flows, config).or_else(|| {
        log::warn!("Newton-Raphson did not converge; falling back to bisection");
        bisection(cash_flows, config)
    })
}

fn newton(cash_flows: &[f64], config: &IrrConfig) -> Option<f64> {
    let mut rate = config.initial_guess;

    for iteration in 0..config.max_iterations {
        let (value, slope) = npv_and_derivative(cash_flows, rate);
        if slope.abs() < FLAT_DERIVATIVE {
            return None;
        }

        let step = rate - value / slope;
        let next = step.clamp(config.lower_bound, config.upper_bound);
        if next != step && next == rate {
            // Pinned against the bracket: the root lies outside it
            return None;
        }
        if (next - rate).abs() < config.tolerance {
            let residual = npv(cash_flows, next);
            if residual.abs() > ROOT_RESIDUAL {
                log::debug!("Newton stalled at {:.8} with NPV {:.6}", next, residual);
                return None;
            }
            log::debug!("IRR {:.8} after {} Newton iterations", next, iteration + 1);
            return Some(next);
        }
        rate = next;
    }

    None
}

fn bisection(cash_flows: &[f64], config: &IrrConfig) -> Option<f64> {
    let mut low = config.lower_bound;
    let mut high = config.upper_bound;
    let mut npv_low = npv(cash_flows, low);

    if npv_low * npv(cash_flows, high) > 0.0 {
        log::debug!("no NPV sign change within [{}, {}]", low, high);
        return None;
    }

    for _ in 0..config.max_iterations {
        let mid = (low + high) / 2.0;
        let npv_mid = npv(cash_flows, mid);

        if npv_mid.abs() < config.tolerance || (high - low) / 2.0 < config.tolerance {
            return Some(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}
