//! Forecast growth and valuation assumptions
//!
//! All rates here are percentages (3.0 = 3%), unlike mortgage rates which are
//! decimals.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastAssumptions {
    /// Yearly rent growth, compounding
    pub annual_rent_increase: f64,

    /// Yearly operating expense growth, compounding
    pub annual_expense_inflation: f64,

    /// Share of gross rent lost to vacancy and collection
    pub vacancy_rate: f64,

    /// Rate applied when the mortgage renews at term end; the expiring rate
    /// carries over when unset
    pub future_interest_rate_on_renewal: Option<f64>,

    /// Yearly property value growth
    pub annual_appreciation: f64,

    /// Cap rate for the final-year valuation; 0 disables it
    pub exit_cap_rate: f64,
}

impl Default for ForecastAssumptions {
    fn default() -> Self {
        Self {
            annual_rent_increase: 2.0,
            annual_expense_inflation: 2.0,
            vacancy_rate: 5.0,
            future_interest_rate_on_renewal: None,
            annual_appreciation: 3.0,
            exit_cap_rate: 0.0,
        }
    }
}

impl ForecastAssumptions {
    /// No growth, no vacancy, no appreciation
    pub fn flat() -> Self {
        Self {
            annual_rent_increase: 0.0,
            annual_expense_inflation: 0.0,
            vacancy_rate: 0.0,
            future_interest_rate_on_renewal: None,
            annual_appreciation: 0.0,
            exit_cap_rate: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("annual_rent_increase", self.annual_rent_increase),
            ("annual_expense_inflation", self.annual_expense_inflation),
            ("vacancy_rate", self.vacancy_rate),
            ("annual_appreciation", self.annual_appreciation),
            ("exit_cap_rate", self.exit_cap_rate),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::InvalidAssumptions(format!("{} must be a finite percentage", name)));
        }

        if self.annual_rent_increase < 0.0 {
            return Err(EngineError::InvalidAssumptions(format!(
                "annual_rent_increase cannot be negative, got {}%",
                self.annual_rent_increase
            )));
        }
        if self.annual_expense_inflation < 0.0 {
            return Err(EngineError::InvalidAssumptions(format!(
                "annual_expense_inflation cannot be negative, got {}%",
                self.annual_expense_inflation
            )));
        }
        if !(0.0..=100.0).contains(&self.vacancy_rate) {
            return Err(EngineError::InvalidAssumptions(format!(
                "vacancy_rate must be within 0..=100%, got {}%",
                self.vacancy_rate
            )));
        }
        if self.annual_appreciation <= -100.0 {
            return Err(EngineError::InvalidAssumptions(format!(
                "annual_appreciation must be above -100%, got {}%",
                self.annual_appreciation
            )));
        }
        if self.exit_cap_rate < 0.0 {
            return Err(EngineError::InvalidAssumptions(format!(
                "exit_cap_rate cannot be negative, got {}%",
                self.exit_cap_rate
            )));
        }
        if let Some(rate) = self.future_interest_rate_on_renewal {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EngineError::InvalidAssumptions(format!(
                    "future_interest_rate_on_renewal must be a non-negative percentage, got {}%",
                    rate
                )));
            }
        }
        Ok(())
    }

    /// Renewal rate as a decimal mortgage rate
    pub fn renewal_rate(&self) -> Option<f64> {
        self.future_interest_rate_on_renewal.map(|pct| pct / 100.0)
    }

    /// Rent growth factor applied in forecast year `year` (1-based)
    pub fn rent_growth_factor(&self, year: u32) -> f64 {
        growth_factor(self.annual_rent_increase, year.saturating_sub(1))
    }

    pub fn expense_growth_factor(&self, year: u32) -> f64 {
        growth_factor(self.annual_expense_inflation, year.saturating_sub(1))
    }

    /// Appreciation factor at the end of forecast year `year`
    pub fn appreciation_factor(&self, year: u32) -> f64 {
        growth_factor(self.annual_appreciation, year)
    }

    pub fn occupancy(&self) -> f64 {
        1.0 - self.vacancy_rate / 100.0
    }
}

fn growth_factor(pct: f64, periods: u32) -> f64 {
    (1.0 + pct / 100.0).powi(periods as i32)
}
