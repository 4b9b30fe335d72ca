//! Batch and parallel scenario evaluation
//!
//! Every engine computation is a pure function of its inputs, so independent
//! forecasts and schedules are fanned out with rayon without coordination.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::forecast::{Forecast, ForecastAssumptions, ForecastConfig, ForecastEngine, PropertyFinancials};
use crate::mortgage::{generate, monthly_equivalent, MortgageTerms, PaymentFrequency};

/// Runs many forecasts under one forecast configuration
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(ForecastConfig::new(2026));
/// let results = runner.run_scenarios(&property, &[base, downside, upside]);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: ForecastConfig,
}

impl ScenarioRunner {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast one property under one assumption set
    pub fn run(&self, property: &PropertyFinancials, assumptions: &ForecastAssumptions) -> Result<Forecast> {
        ForecastEngine::new(assumptions.clone(), self.config.clone()).forecast(property)
    }

    /// Forecast several properties under the same assumptions
    pub fn run_batch(
        &self,
        properties: &[PropertyFinancials],
        assumptions: &ForecastAssumptions,
    ) -> Vec<Result<Forecast>> {
        log::info!("forecasting {} properties", properties.len());
        let engine = ForecastEngine::new(assumptions.clone(), self.config.clone());
        properties.par_iter().map(|p| engine.forecast(p)).collect()
    }

    /// Forecast one property under several assumption sets, in input order
    pub fn run_scenarios(
        &self,
        property: &PropertyFinancials,
        scenarios: &[ForecastAssumptions],
    ) -> Vec<Result<Forecast>> {
        log::info!("running {} forecast scenarios", scenarios.len());
        scenarios
            .par_iter()
            .map(|assumptions| self.run(property, assumptions))
            .collect()
    }
}

/// Schedule summary for one payment frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyComparison {
    pub frequency: PaymentFrequency,
    pub payment: f64,
    pub monthly_equivalent: f64,
    pub payments: usize,
    pub total_interest: f64,
    /// Balance left when the schedule ends
    pub final_balance: f64,
    pub payoff_date: Option<NaiveDate>,
}

/// Schedule the same loan under every payment frequency
pub fn compare_frequencies(terms: &MortgageTerms) -> Result<Vec<FrequencyComparison>> {
    log::info!("comparing {} payment frequencies", PaymentFrequency::ALL.len());
    PaymentFrequency::ALL
        .par_iter()
        .map(|&frequency| -> Result<FrequencyComparison> {
            let schedule = generate(&MortgageTerms {
                payment_frequency: frequency,
                ..terms.clone()
            })?;
            Ok(FrequencyComparison {
                frequency,
                payment: schedule.payment,
                monthly_equivalent: monthly_equivalent(schedule.payment, frequency),
                payments: schedule.len(),
                total_interest: schedule.total_interest(),
                final_balance: schedule.final_balance(),
                payoff_date: schedule.payoff_date(),
            })
        })
        .collect()
}
