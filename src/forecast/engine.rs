//! Multi-year cash-flow and equity projection

use serde::{Deserialize, Serialize};

use super::assumptions::ForecastAssumptions;
use super::projection::{CashFlowYear, EquityYear, Forecast, ForecastMode, YearlyProjection};
use super::property::PropertyFinancials;
use crate::error::{EngineError, Result};
use crate::mortgage::{amortize_through, AmortizationSchedule};

pub const DEFAULT_FORECAST_YEARS: u32 = 10;

/// Longest supported horizon
pub const MAX_FORECAST_YEARS: u32 = 50;

/// Configuration for a forecast run
///
/// The start year is always supplied by the caller; the engine never reads
/// the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Calendar year of forecast year 1
    pub start_year: i32,

    /// Number of years to project
    pub years: u32,

    pub mode: ForecastMode,
}

impl ForecastConfig {
    pub fn new(start_year: i32) -> Self {
        Self {
            start_year,
            years: DEFAULT_FORECAST_YEARS,
            mode: ForecastMode::CashFlow,
        }
    }

    pub fn with_years(mut self, years: u32) -> Self {
        self.years = years;
        self
    }

    pub fn with_mode(mut self, mode: ForecastMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn last_calendar_year(&self) -> i32 {
        self.start_year + self.years as i32 - 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.years == 0 || self.years > MAX_FORECAST_YEARS {
            return Err(EngineError::invalid(
                "years",
                format!("forecast horizon must be within 1..={}, got {}", MAX_FORECAST_YEARS, self.years),
            ));
        }
        Ok(())
    }
}

/// Operating figures shared by both forecast modes
#[derive(Debug, Clone, Copy)]
struct OperatingYear {
    rental_income: f64,
    operating_expenses: f64,
}

impl OperatingYear {
    fn net_operating_income(&self) -> f64 {
        self.rental_income - self.operating_expenses
    }
}

/// Forecast engine bound to one set of assumptions
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    assumptions: ForecastAssumptions,
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(assumptions: ForecastAssumptions, config: ForecastConfig) -> Self {
        Self { assumptions, config }
    }

    pub fn assumptions(&self) -> &ForecastAssumptions {
        &self.assumptions
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Project the property over the configured horizon
    pub fn forecast(&self, property: &PropertyFinancials) -> Result<Forecast> {
        self.assumptions.validate()?;
        self.config.validate()?;
        property.validate()?;
        let starting_value = property.starting_value()?;

        let debt = self.debt_schedule(property)?;
        let starting_mortgage_balance = debt
            .as_ref()
            .map(|s| s.balance_at_end_of_year(self.config.start_year - 1))
            .unwrap_or(0.0);

        let operating: Vec<OperatingYear> = (1..=self.config.years)
            .map(|year| self.operating_year(property, year))
            .collect();
        let final_noi = operating
            .last()
            .map(OperatingYear::net_operating_income)
            .unwrap_or(0.0);
        let exit_value = self.exit_value(starting_value, final_noi);

        let years = match self.config.mode {
            ForecastMode::CashFlow => self.cash_flow_years(&operating, debt.as_ref()),
            ForecastMode::Equity => self.equity_years(
                &operating,
                debt.as_ref(),
                starting_value,
                starting_mortgage_balance,
                exit_value,
            ),
        };

        log::debug!(
            "{:?} forecast {}..={} from value {:.2}, exit value {:.2}",
            self.config.mode,
            self.config.start_year,
            self.config.last_calendar_year(),
            starting_value,
            exit_value
        );

        Ok(Forecast {
            mode: self.config.mode,
            start_year: self.config.start_year,
            assumptions: self.assumptions.clone(),
            starting_value,
            starting_mortgage_balance,
            exit_value,
            years,
        })
    }

    /// Mortgage schedule covering the horizon, renewals included
    fn debt_schedule(&self, property: &PropertyFinancials) -> Result<Option<AmortizationSchedule>> {
        property
            .mortgage
            .as_ref()
            .map(|terms| {
                amortize_through(
                    terms,
                    self.config.last_calendar_year(),
                    self.assumptions.renewal_rate(),
                )
            })
            .transpose()
    }

    fn operating_year(&self, property: &PropertyFinancials, year: u32) -> OperatingYear {
        let rent = property.monthly_rent * self.assumptions.rent_growth_factor(year);
        OperatingYear {
            rental_income: rent * self.assumptions.occupancy() * 12.0,
            operating_expenses: property.monthly_operating_expenses()
                * 12.0
                * self.assumptions.expense_growth_factor(year),
        }
    }

    /// Value at the end of the horizon
    ///
    /// A positive exit cap rate values the property on the final year's NOI
    /// and overrides compounded appreciation.
    fn exit_value(&self, starting_value: f64, final_noi: f64) -> f64 {
        if self.assumptions.exit_cap_rate > 0.0 {
            final_noi / (self.assumptions.exit_cap_rate / 100.0)
        } else {
            starting_value * self.assumptions.appreciation_factor(self.config.years)
        }
    }

    fn calendar_year(&self, year: u32) -> i32 {
        self.config.start_year + year as i32 - 1
    }

    fn cash_flow_years(
        &self,
        operating: &[OperatingYear],
        debt: Option<&AmortizationSchedule>,
    ) -> Vec<YearlyProjection> {
        operating
            .iter()
            .zip(1..)
            .scan(0.0, |cumulative, (op, year)| {
                let calendar_year = self.calendar_year(year);
                let service = debt.map(|s| s.debt_service_for_year(calendar_year));
                let (principal, interest, balance) = service
                    .map(|s| (s.principal, s.interest, s.ending_balance))
                    .unwrap_or((0.0, 0.0, 0.0));

                let net_operating_income = op.net_operating_income();
                let net_cash_flow = op.rental_income - op.operating_expenses - (principal + interest);
                *cumulative += net_cash_flow;

                Some(YearlyProjection::CashFlow(CashFlowYear {
                    year,
                    calendar_year,
                    rental_income: op.rental_income,
                    operating_expenses: op.operating_expenses,
                    net_operating_income,
                    debt_service_principal: principal,
                    debt_service_interest: interest,
                    net_cash_flow,
                    cumulative_cash_flow: *cumulative,
                    mortgage_balance: balance,
                }))
            })
            .collect()
    }

    fn equity_years(
        &self,
        operating: &[OperatingYear],
        debt: Option<&AmortizationSchedule>,
        starting_value: f64,
        starting_mortgage_balance: f64,
        exit_value: f64,
    ) -> Vec<YearlyProjection> {
        let horizon = self.config.years;
        operating
            .iter()
            .zip(1..)
            .scan(None, |prior_equity: &mut Option<f64>, (op, year)| {
                let calendar_year = self.calendar_year(year);
                let property_value = if year == horizon {
                    exit_value
                } else {
                    starting_value * self.assumptions.appreciation_factor(year)
                };
                let mortgage_balance = debt
                    .map(|s| s.balance_at_end_of_year(calendar_year))
                    .unwrap_or(0.0);
                let equity = property_value - mortgage_balance;

                let equity_growth_rate = match *prior_equity {
                    Some(prior) if prior > 0.0 => (equity - prior) / prior * 100.0,
                    _ => 0.0,
                };
                *prior_equity = Some(equity);

                Some(YearlyProjection::Equity(EquityYear {
                    year,
                    calendar_year,
                    property_value,
                    mortgage_balance,
                    equity,
                    equity_from_appreciation: property_value - starting_value,
                    equity_from_paydown: starting_mortgage_balance - mortgage_balance,
                    equity_growth_rate,
                    net_operating_income: op.net_operating_income(),
                }))
            })
            .collect()
    }
}

/// Project `property` under `assumptions`
pub fn forecast(
    property: &PropertyFinancials,
    assumptions: &ForecastAssumptions,
    config: &ForecastConfig,
) -> Result<Forecast> {
    ForecastEngine::new(assumptions.clone(), config.clone()).forecast(property)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::property::OperatingExpenses;
    use crate::mortgage::{generate, MortgageTerms, PaymentFrequency, RateType};
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn flat_property() -> PropertyFinancials {
        PropertyFinancials::new(3_200.0, OperatingExpenses::flat(800.0)).with_purchase_price(500_000.0)
    }

    fn mortgage() -> MortgageTerms {
        MortgageTerms::new(
            400_000.0,
            0.05,
            RateType::Fixed,
            300,
            60,
            PaymentFrequency::Monthly,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        )
    }

    fn flat_assumptions() -> ForecastAssumptions {
        ForecastAssumptions {
            vacancy_rate: 5.0,
            ..ForecastAssumptions::flat()
        }
    }

    #[test]
    fn test_flat_property_has_identical_years() {
        let forecast = forecast(&flat_property(), &flat_assumptions(), &ForecastConfig::new(2026)).unwrap();

        assert_eq!(forecast.horizon(), 10);
        let expected = (3_200.0 * 0.95 - 800.0) * 12.0;
        for (i, year) in forecast.cash_flow_years().enumerate() {
            assert_eq!(year.year, i as u32 + 1);
            assert_eq!(year.calendar_year, 2026 + i as i32);
            assert_abs_diff_eq!(year.net_cash_flow, expected, epsilon = 1e-6);
            assert_abs_diff_eq!(year.cumulative_cash_flow, expected * (i as f64 + 1.0), epsilon = 1e-6);
            assert_eq!(year.debt_service(), 0.0);
            assert_eq!(year.mortgage_balance, 0.0);
        }
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let property = flat_property().with_mortgage(mortgage());
        let assumptions = ForecastAssumptions {
            future_interest_rate_on_renewal: Some(6.0),
            ..ForecastAssumptions::default()
        };
        let config = ForecastConfig::new(2026);

        let first = forecast(&property, &assumptions, &config).unwrap();
        let second = forecast(&property, &assumptions, &config).unwrap();
        assert_eq!(first, second);
        for (a, b) in first.cash_flow_years().zip(second.cash_flow_years()) {
            assert_eq!(a.net_cash_flow.to_bits(), b.net_cash_flow.to_bits());
            assert_eq!(a.mortgage_balance.to_bits(), b.mortgage_balance.to_bits());
        }
    }

    #[test]
    fn test_rent_and_expenses_compound() {
        let assumptions = ForecastAssumptions {
            annual_rent_increase: 3.0,
            annual_expense_inflation: 2.0,
            vacancy_rate: 0.0,
            ..ForecastAssumptions::flat()
        };
        let forecast = forecast(&flat_property(), &assumptions, &ForecastConfig::new(2026).with_years(5)).unwrap();
        let years: Vec<_> = forecast.cash_flow_years().collect();

        assert_eq!(years.len(), 5);
        assert_abs_diff_eq!(years[0].rental_income, 38_400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(years[2].rental_income, 38_400.0 * 1.03 * 1.03, epsilon = 1e-6);
        assert_abs_diff_eq!(years[4].operating_expenses, 9_600.0 * 1.02_f64.powi(4), epsilon = 1e-6);
        assert_abs_diff_eq!(
            years[3].net_operating_income,
            years[3].rental_income - years[3].operating_expenses,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_debt_service_follows_schedule() {
        let property = flat_property().with_mortgage(mortgage());
        let forecast = forecast(&property, &flat_assumptions(), &ForecastConfig::new(2026).with_years(4)).unwrap();
        let schedule = generate(&mortgage()).unwrap();

        assert_abs_diff_eq!(forecast.starting_mortgage_balance, 400_000.0, epsilon = 1e-9);
        for year in forecast.cash_flow_years() {
            let expected = schedule.debt_service_for_year(year.calendar_year);
            assert_eq!(expected.payments, 12);
            assert_abs_diff_eq!(year.debt_service(), expected.total(), epsilon = 1e-9);
            assert_abs_diff_eq!(year.mortgage_balance, expected.ending_balance, epsilon = 1e-9);
            assert_abs_diff_eq!(
                year.net_cash_flow,
                year.net_operating_income - year.debt_service(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_debt_service_stops_after_payoff() {
        let short_loan = MortgageTerms {
            original_amount: 50_000.0,
            amortization_months: 36,
            term_months: 36,
            ..mortgage()
        };
        let property = flat_property().with_mortgage(short_loan);
        let forecast = forecast(&property, &flat_assumptions(), &ForecastConfig::new(2026)).unwrap();
        let years: Vec<_> = forecast.cash_flow_years().collect();

        assert!(years[0].debt_service() > 0.0);
        for year in &years[3..] {
            assert_eq!(year.debt_service(), 0.0);
            assert_eq!(year.mortgage_balance, 0.0);
        }
        assert!(years[9].net_cash_flow > years[0].net_cash_flow);
    }

    #[test]
    fn test_renewal_rate_changes_debt_service() {
        let property = flat_property().with_mortgage(mortgage());
        let config = ForecastConfig::new(2026);
        let same = forecast(&property, &flat_assumptions(), &config).unwrap();
        let higher = forecast(
            &property,
            &ForecastAssumptions {
                future_interest_rate_on_renewal: Some(8.0),
                ..flat_assumptions()
            },
            &config,
        )
        .unwrap();

        let same_years: Vec<_> = same.cash_flow_years().collect();
        let higher_years: Vec<_> = higher.cash_flow_years().collect();
        // Renewal happens in December 2030; 2031 is the first full renewed year
        assert_abs_diff_eq!(same_years[0].debt_service(), higher_years[0].debt_service(), epsilon = 1e-9);
        assert!(higher_years[5].debt_service() > same_years[5].debt_service() + 1_000.0);
        assert!(same_years[9].mortgage_balance > 0.0);
    }

    #[test]
    fn test_equity_mode() {
        let assumptions = ForecastAssumptions {
            annual_appreciation: 3.0,
            exit_cap_rate: 6.0,
            ..flat_assumptions()
        };
        let property = flat_property().with_mortgage(mortgage());
        let config = ForecastConfig::new(2026).with_mode(ForecastMode::Equity);
        let forecast = forecast(&property, &assumptions, &config).unwrap();
        let years: Vec<_> = forecast.equity_years().collect();

        assert_eq!(years.len(), 10);
        assert_abs_diff_eq!(years[0].property_value, 515_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(years[8].property_value, 500_000.0 * 1.03_f64.powi(9), epsilon = 1e-6);

        // Final year is valued on NOI at the exit cap rate
        let final_noi = (3_200.0 * 0.95 - 800.0) * 12.0;
        assert_abs_diff_eq!(years[9].property_value, final_noi / 0.06, epsilon = 1e-6);
        assert_abs_diff_eq!(forecast.exit_value, final_noi / 0.06, epsilon = 1e-6);

        assert_eq!(years[0].equity_growth_rate, 0.0);
        for year in &years {
            assert_abs_diff_eq!(year.equity, year.property_value - year.mortgage_balance, epsilon = 1e-9);
            assert_abs_diff_eq!(
                year.equity,
                forecast.starting_equity() + year.equity_from_appreciation + year.equity_from_paydown,
                epsilon = 1e-6
            );
            assert!(year.equity_from_paydown > 0.0);
        }
        let growth = (years[1].equity - years[0].equity) / years[0].equity * 100.0;
        assert_abs_diff_eq!(years[1].equity_growth_rate, growth, epsilon = 1e-9);
    }

    #[test]
    fn test_equity_growth_undefined_after_negative_equity() {
        let underwater = PropertyFinancials::new(3_200.0, OperatingExpenses::flat(800.0))
            .with_purchase_price(300_000.0)
            .with_mortgage(mortgage());
        let config = ForecastConfig::new(2026).with_mode(ForecastMode::Equity).with_years(3);
        let forecast = forecast(&underwater, &ForecastAssumptions::flat(), &config).unwrap();
        let years: Vec<_> = forecast.equity_years().collect();

        assert!(years[0].equity < 0.0);
        assert_eq!(years[1].equity_growth_rate, 0.0);
    }

    #[test]
    fn test_preconditions() {
        let assumptions = ForecastAssumptions {
            annual_expense_inflation: -3.0,
            ..ForecastAssumptions::default()
        };
        let config = ForecastConfig::new(2026);
        assert!(matches!(
            forecast(&flat_property(), &assumptions, &config),
            Err(EngineError::InvalidAssumptions(_))
        ));

        let no_value = PropertyFinancials::new(3_200.0, OperatingExpenses::flat(800.0));
        assert_eq!(
            forecast(&no_value, &ForecastAssumptions::default(), &config),
            Err(EngineError::MissingPropertyValue)
        );

        assert!(forecast(&flat_property(), &ForecastAssumptions::default(), &config.clone().with_years(0)).is_err());
    }
}
