//! Rental property cash-flow and equity forecasting

pub mod assumptions;
pub mod engine;
pub mod projection;
pub mod property;

pub use assumptions::ForecastAssumptions;
pub use engine::{forecast, ForecastConfig, ForecastEngine, DEFAULT_FORECAST_YEARS, MAX_FORECAST_YEARS};
pub use projection::{CashFlowYear, EquityYear, Forecast, ForecastMode, YearlyProjection};
pub use property::{OperatingExpenses, PropertyFinancials};
