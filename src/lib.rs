//! Property Forecast - mortgage amortization and income-property forecasting
//!
//! This library provides:
//! - Nominal-to-periodic rate conversion for fixed (semi-annual) and variable
//!   (monthly) compounding
//! - Payment sizing and amortization schedules for six payment frequencies
//! - Lump-sum and increased-payment prepayment analysis
//! - Refinance comparison with break-even
//! - Multi-year cash-flow and equity forecasts for rental properties
//! - IRR/NPV and ratio-based return metrics
//!
//! Every computation is deterministic and free of I/O; the forecast start year
//! is always passed in by the caller.

pub mod analysis;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod mortgage;
pub mod scenario;

// Re-export commonly used types
pub use error::{EngineError, ErrorKind, Result};
pub use forecast::{Forecast, ForecastAssumptions, ForecastConfig, ForecastEngine, ForecastMode, PropertyFinancials};
pub use metrics::{irr, npv, ReturnMetrics};
pub use mortgage::{AmortizationSchedule, MortgageTerms, PaymentFrequency, PaymentRecord, RateType};
pub use scenario::ScenarioRunner;
