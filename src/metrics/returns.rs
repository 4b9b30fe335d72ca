//! Investment return metrics derived from a cash-flow forecast

use serde::{Deserialize, Serialize};

use super::irr::{irr_with, npv, IrrConfig};
use crate::error::{EngineError, Result};
use crate::forecast::{CashFlowYear, Forecast, ForecastMode};

/// Return metrics for one forecast
///
/// Derived read-only; nothing here is written back onto the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// Internal rate of return in percent; `None` when undefined
    pub irr: Option<f64>,

    /// NPV of the investment cash flows at `discount_rate`
    pub npv: f64,

    /// Discount rate as a decimal
    pub discount_rate: f64,

    pub average_annual_cash_flow: f64,

    /// Average NOI over average rental income
    pub operating_margin: f64,

    /// Average NOI over average debt service; 0 without debt
    pub debt_service_coverage_ratio: f64,

    /// Year-1 net cash flow over initial equity, in percent
    pub cash_on_cash_return: f64,

    /// Year-1 NOI over starting value, in percent
    pub going_in_cap_rate: f64,

    /// Starting value less the starting mortgage balance
    pub initial_equity: f64,

    /// Exit value less the final mortgage balance
    pub sale_proceeds: f64,

    /// `[-initial_equity, cf_1, ..., cf_n + sale_proceeds]`
    pub cash_flows: Vec<f64>,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn average(years: &[&CashFlowYear], value: impl Fn(&CashFlowYear) -> f64) -> f64 {
    let sum = years.iter().fold(0.0, |total, year| total + value(*year));
    ratio(sum, years.len() as f64)
}

fn cash_flow_years(forecast: &Forecast) -> Result<Vec<&CashFlowYear>> {
    if forecast.mode != ForecastMode::CashFlow {
        return Err(EngineError::invalid(
            "forecast",
            "return metrics need a cash-flow forecast",
        ));
    }
    Ok(forecast.cash_flow_years().collect())
}

/// Equity-investor cash flows: purchase equity out, yearly net cash flow in,
/// sale proceeds added to the final year
pub fn investment_cash_flows(forecast: &Forecast) -> Result<Vec<f64>> {
    let years = cash_flow_years(forecast)?;
    let sale_proceeds = forecast.exit_value - forecast.final_mortgage_balance();
    let last = years.len();

    let flows = std::iter::once(-forecast.starting_equity())
        .chain(years.iter().enumerate().map(|(i, year)| {
            if i + 1 == last {
                year.net_cash_flow + sale_proceeds
            } else {
                year.net_cash_flow
            }
        }))
        .collect();
    Ok(flows)
}

/// Compute return metrics with the default IRR solver settings
pub fn evaluate(forecast: &Forecast, discount_rate: f64) -> Result<ReturnMetrics> {
    evaluate_with(forecast, discount_rate, &IrrConfig::default())
}

pub fn evaluate_with(forecast: &Forecast, discount_rate: f64, config: &IrrConfig) -> Result<ReturnMetrics> {
    if !discount_rate.is_finite() || discount_rate <= -1.0 {
        return Err(EngineError::invalid(
            "discount_rate",
            format!("must be a finite decimal above -1, got {}", discount_rate),
        ));
    }

    let years = cash_flow_years(forecast)?;
    let cash_flows = investment_cash_flows(forecast)?;
    let initial_equity = forecast.starting_equity();
    let sale_proceeds = forecast.exit_value - forecast.final_mortgage_balance();

    let average_noi = average(&years, |y| y.net_operating_income);
    let first = years.first();

    let metrics = ReturnMetrics {
        irr: irr_with(&cash_flows, config).map(|rate| rate * 100.0),
        npv: npv(&cash_flows, discount_rate),
        discount_rate,
        average_annual_cash_flow: average(&years, |y| y.net_cash_flow),
        operating_margin: ratio(average_noi, average(&years, |y| y.rental_income)),
        debt_service_coverage_ratio: ratio(average_noi, average(&years, |y| y.debt_service())),
        cash_on_cash_return: if initial_equity > 0.0 {
            first.map(|y| y.net_cash_flow / initial_equity * 100.0).unwrap_or(0.0)
        } else {
            0.0
        },
        going_in_cap_rate: first
            .map(|y| ratio(y.net_operating_income, forecast.starting_value) * 100.0)
            .unwrap_or(0.0),
        initial_equity,
        sale_proceeds,
        cash_flows,
    };

    log::debug!(
        "return metrics over {} years: irr {:?}, npv {:.2} at {:.4}",
        years.len(),
        metrics.irr,
        metrics.npv,
        discount_rate
    );
    Ok(metrics)
}
