//! Forecast output records

use serde::{Deserialize, Serialize};

use super::assumptions::ForecastAssumptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastMode {
    #[default]
    CashFlow,
    Equity,
}

/// One year of a cash-flow forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    /// Forecast year (1-based)
    pub year: u32,
    pub calendar_year: i32,
    /// Rent collected after vacancy
    pub rental_income: f64,
    pub operating_expenses: f64,
    pub net_operating_income: f64,
    pub debt_service_principal: f64,
    pub debt_service_interest: f64,
    pub net_cash_flow: f64,
    pub cumulative_cash_flow: f64,
    /// Mortgage balance at year end
    pub mortgage_balance: f64,
}

impl CashFlowYear {
    pub fn debt_service(&self) -> f64 {
        self.debt_service_principal + self.debt_service_interest
    }
}

/// One year of an equity forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityYear {
    pub year: u32,
    pub calendar_year: i32,
    pub property_value: f64,
    pub mortgage_balance: f64,
    pub equity: f64,
    pub equity_from_appreciation: f64,
    pub equity_from_paydown: f64,
    /// Year-over-year equity change in percent; 0 for the first year or
    /// when the prior year's equity was not positive
    pub equity_growth_rate: f64,
    pub net_operating_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YearlyProjection {
    CashFlow(CashFlowYear),
    Equity(EquityYear),
}

impl YearlyProjection {
    pub fn year(&self) -> u32 {
        match self {
            YearlyProjection::CashFlow(y) => y.year,
            YearlyProjection::Equity(y) => y.year,
        }
    }

    pub fn calendar_year(&self) -> i32 {
        match self {
            YearlyProjection::CashFlow(y) => y.calendar_year,
            YearlyProjection::Equity(y) => y.calendar_year,
        }
    }

    pub fn mortgage_balance(&self) -> f64 {
        match self {
            YearlyProjection::CashFlow(y) => y.mortgage_balance,
            YearlyProjection::Equity(y) => y.mortgage_balance,
        }
    }

    pub fn as_cash_flow(&self) -> Option<&CashFlowYear> {
        match self {
            YearlyProjection::CashFlow(y) => Some(y),
            YearlyProjection::Equity(_) => None,
        }
    }

    pub fn as_equity(&self) -> Option<&EquityYear> {
        match self {
            YearlyProjection::Equity(y) => Some(y),
            YearlyProjection::CashFlow(_) => None,
        }
    }
}

/// Fixed-horizon projection together with the inputs it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub mode: ForecastMode,
    /// Calendar year of forecast year 1
    pub start_year: i32,
    /// Snapshot of the assumptions used
    pub assumptions: ForecastAssumptions,
    pub starting_value: f64,
    /// Mortgage balance outstanding when the forecast starts
    pub starting_mortgage_balance: f64,
    /// Property value at the end of the horizon
    pub exit_value: f64,
    pub years: Vec<YearlyProjection>,
}

impl Forecast {
    pub fn horizon(&self) -> usize {
        self.years.len()
    }

    pub fn cash_flow_years(&self) -> impl Iterator<Item = &CashFlowYear> {
        self.years.iter().filter_map(YearlyProjection::as_cash_flow)
    }

    pub fn equity_years(&self) -> impl Iterator<Item = &EquityYear> {
        self.years.iter().filter_map(YearlyProjection::as_equity)
    }

    pub fn final_mortgage_balance(&self) -> f64 {
        self.years
            .last()
            .map(YearlyProjection::mortgage_balance)
            .unwrap_or(self.starting_mortgage_balance)
    }

    pub fn starting_equity(&self) -> f64 {
        self.starting_value - self.starting_mortgage_balance
    }
}
