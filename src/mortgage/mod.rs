//! Mortgage terms, rate conversion, payment sizing and amortization

mod payment;
mod rates;
mod schedule;
mod terms;

pub use payment::{annuity_payment, monthly_equivalent, payment_amount, payment_for_terms, round_to_cents};
pub use rates::{effective_annual_rate, periodic_rate};
pub use schedule::{amortize_through, generate, AmortizationSchedule, PaymentRecord, YearlyDebtService};
pub use terms::{MortgageTerms, PaymentFrequency, RateType, MAX_AMORTIZATION_MONTHS, MAX_TERM_MONTHS};

pub(crate) use schedule::Amortizer;
