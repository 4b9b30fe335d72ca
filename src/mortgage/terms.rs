//! Mortgage terms, payment frequencies and rate conventions

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Longest supported amortization period (50 years)
pub const MAX_AMORTIZATION_MONTHS: u32 = 600;

/// Longest supported term (30 years)
pub const MAX_TERM_MONTHS: u32 = 360;

/// How the quoted annual rate compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum RateType {
    /// Compounded semi-annually (Canadian fixed-rate convention)
    Fixed,
    /// Compounded monthly
    Variable,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Fixed => "FIXED",
            RateType::Variable => "VARIABLE",
        }
    }
}

impl FromStr for RateType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "FIXED" => Ok(RateType::Fixed),
            "VARIABLE" => Ok(RateType::Variable),
            _ => Err(EngineError::InvalidRateType(s.to_string())),
        }
    }
}

impl TryFrom<String> for RateType {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment frequency options offered by lenders
///
/// Accelerated frequencies accrue interest at the bi-weekly/weekly periodic
/// rate but size the payment as a fraction of the monthly payment, which adds
/// the equivalent of one monthly payment per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum PaymentFrequency {
    Monthly,
    SemiMonthly,
    BiWeekly,
    AcceleratedBiWeekly,
    Weekly,
    AcceleratedWeekly,
}

impl PaymentFrequency {
    pub const ALL: [PaymentFrequency; 6] = [
        PaymentFrequency::Monthly,
        PaymentFrequency::SemiMonthly,
        PaymentFrequency::BiWeekly,
        PaymentFrequency::AcceleratedBiWeekly,
        PaymentFrequency::Weekly,
        PaymentFrequency::AcceleratedWeekly,
    ];

    /// Number of payments made in one year
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(
            self,
            PaymentFrequency::AcceleratedBiWeekly | PaymentFrequency::AcceleratedWeekly
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "MONTHLY",
            PaymentFrequency::SemiMonthly => "SEMI_MONTHLY",
            PaymentFrequency::BiWeekly => "BI_WEEKLY",
            PaymentFrequency::AcceleratedBiWeekly => "ACCELERATED_BI_WEEKLY",
            PaymentFrequency::Weekly => "WEEKLY",
            PaymentFrequency::AcceleratedWeekly => "ACCELERATED_WEEKLY",
        }
    }

    /// Number of payments falling in a span of whole months
    pub fn payments_in_months(&self, months: u32) -> u32 {
        (months as f64 * self.periods_per_year() as f64 / 12.0).round() as u32
    }

    /// Date of payment `n` (1-based) for a loan advanced on `start`
    ///
    /// Computed from the start date rather than stepped, so month-end
    /// clamping in one period never shifts later payments.
    pub fn payment_date(&self, start: NaiveDate, n: u32) -> NaiveDate {
        let date = match self {
            PaymentFrequency::Monthly => start.checked_add_months(Months::new(n)),
            PaymentFrequency::SemiMonthly => start
                .checked_add_months(Months::new(n / 2))
                .and_then(|d| d.checked_add_days(Days::new(if n % 2 == 1 { 15 } else { 0 }))),
            PaymentFrequency::BiWeekly | PaymentFrequency::AcceleratedBiWeekly => {
                start.checked_add_days(Days::new(14 * n as u64))
            }
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => {
                start.checked_add_days(Days::new(7 * n as u64))
            }
        };
        date.unwrap_or(NaiveDate::MAX)
    }
}

impl FromStr for PaymentFrequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "MONTHLY" => Ok(PaymentFrequency::Monthly),
            "SEMI_MONTHLY" => Ok(PaymentFrequency::SemiMonthly),
            "BI_WEEKLY" => Ok(PaymentFrequency::BiWeekly),
            "ACCELERATED_BI_WEEKLY" => Ok(PaymentFrequency::AcceleratedBiWeekly),
            "WEEKLY" => Ok(PaymentFrequency::Weekly),
            "ACCELERATED_WEEKLY" => Ok(PaymentFrequency::AcceleratedWeekly),
            _ => Err(EngineError::InvalidFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for PaymentFrequency {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `bi-weekly`, `Bi Weekly`, `BI_WEEKLY` and so on
fn normalize_token(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Terms of a single mortgage
///
/// Terms are never modified once a schedule has been generated from them;
/// scenarios build new terms through [`MortgageTerms::with_principal`] and
/// [`MortgageTerms::renewed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageTerms {
    /// Amount borrowed
    pub original_amount: f64,

    /// Nominal annual rate as a decimal (0.045 = 4.5%)
    pub annual_interest_rate: f64,

    pub rate_type: RateType,

    /// Amortization period in months (1..=600)
    pub amortization_months: u32,

    /// Term in months (1..=360, never longer than the amortization)
    pub term_months: u32,

    pub payment_frequency: PaymentFrequency,

    /// Date the funds are advanced; the first payment falls one period later
    pub start_date: NaiveDate,
}

impl MortgageTerms {
    pub fn new(
        original_amount: f64,
        annual_interest_rate: f64,
        rate_type: RateType,
        amortization_months: u32,
        term_months: u32,
        payment_frequency: PaymentFrequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            original_amount,
            annual_interest_rate,
            rate_type,
            amortization_months,
            term_months,
            payment_frequency,
            start_date,
        }
    }

    /// Check ranges and the term/amortization relationship
    ///
    /// A non-positive principal is not rejected here: a paid-off loan is a
    /// valid state and produces an empty schedule.
    pub fn validate(&self) -> Result<()> {
        if !self.original_amount.is_finite() {
            return Err(EngineError::invalid("original_amount", "must be a finite number"));
        }
        if !self.annual_interest_rate.is_finite() || self.annual_interest_rate < 0.0 {
            return Err(EngineError::invalid(
                "annual_interest_rate",
                format!("must be a non-negative decimal, got {}", self.annual_interest_rate),
            ));
        }
        if self.amortization_months == 0 || self.amortization_months > MAX_AMORTIZATION_MONTHS {
            return Err(EngineError::invalid(
                "amortization_months",
                format!("must be within 1..={}, got {}", MAX_AMORTIZATION_MONTHS, self.amortization_months),
            ));
        }
        if self.term_months == 0 || self.term_months > MAX_TERM_MONTHS {
            return Err(EngineError::invalid(
                "term_months",
                format!("must be within 1..={}, got {}", MAX_TERM_MONTHS, self.term_months),
            ));
        }
        if self.term_months > self.amortization_months {
            return Err(EngineError::invalid(
                "term_months",
                format!(
                    "term of {} months exceeds amortization of {} months",
                    self.term_months, self.amortization_months
                ),
            ));
        }
        Ok(())
    }

    pub fn amortization_years(&self) -> f64 {
        self.amortization_months as f64 / 12.0
    }

    /// Payments needed to retire the loan over the full amortization
    pub fn amortization_payments(&self) -> u32 {
        self.payment_frequency.payments_in_months(self.amortization_months)
    }

    /// Payments falling within the term
    pub fn term_payments(&self) -> u32 {
        self.payment_frequency.payments_in_months(self.term_months)
    }

    /// Upper bound on the length of a generated schedule
    pub fn scheduled_payments(&self) -> u32 {
        self.amortization_payments().min(self.term_payments())
    }

    /// Same loan with a different outstanding principal
    pub fn with_principal(&self, principal: f64) -> Self {
        Self {
            original_amount: principal,
            ..self.clone()
        }
    }

    /// Terms for renewing `balance` at the end of this term
    ///
    /// The renewed loan keeps the frequency, rate type and term length, runs
    /// over the amortization left after this term and starts on `start_date`.
    /// Returns `None` once nothing is left to amortize.
    pub fn renewed(&self, balance: f64, annual_interest_rate: f64, start_date: NaiveDate) -> Option<Self> {
        let remaining = self.amortization_months.saturating_sub(self.term_months);
        if remaining == 0 || balance <= 0.0 {
            return None;
        }
        Some(Self {
            original_amount: balance,
            annual_interest_rate,
            amortization_months: remaining,
            term_months: self.term_months.min(remaining),
            start_date,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_terms() -> MortgageTerms {
        MortgageTerms::new(
            300_000.0,
            0.05,
            RateType::Fixed,
            300,
            60,
            PaymentFrequency::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("monthly".parse::<PaymentFrequency>().unwrap(), PaymentFrequency::Monthly);
        assert_eq!(
            "accelerated-bi-weekly".parse::<PaymentFrequency>().unwrap(),
            PaymentFrequency::AcceleratedBiWeekly
        );
        assert_eq!(
            "FORTNIGHTLY".parse::<PaymentFrequency>(),
            Err(EngineError::InvalidFrequency("FORTNIGHTLY".to_string()))
        );
        assert!(matches!("floating".parse::<RateType>(), Err(EngineError::InvalidRateType(_))));
    }

    #[test]
    fn test_frequency_deserialization_rejects_unknown() {
        let ok: PaymentFrequency = serde_json::from_str("\"SEMI_MONTHLY\"").unwrap();
        assert_eq!(ok, PaymentFrequency::SemiMonthly);
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"SEMI_MONTHLY\"");

        let err = serde_json::from_str::<PaymentFrequency>("\"QUARTERLY\"").unwrap_err();
        assert!(err.to_string().contains("QUARTERLY"));
    }

    #[test]
    fn test_payment_dates_do_not_drift() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let monthly = PaymentFrequency::Monthly;
        assert_eq!(monthly.payment_date(start, 1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(monthly.payment_date(start, 2), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        let semi = PaymentFrequency::SemiMonthly;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(semi.payment_date(start, 1), NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(semi.payment_date(start, 2), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let weekly = PaymentFrequency::AcceleratedWeekly;
        assert_eq!(weekly.payment_date(start, 2), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_payment_counts() {
        let terms = sample_terms();
        assert_eq!(terms.amortization_payments(), 300);
        assert_eq!(terms.term_payments(), 60);
        assert_eq!(terms.scheduled_payments(), 60);

        let biweekly = MortgageTerms {
            payment_frequency: PaymentFrequency::BiWeekly,
            ..terms
        };
        assert_eq!(biweekly.amortization_payments(), 650);
        assert_eq!(biweekly.term_payments(), 130);
    }

    #[test]
    fn test_validation() {
        assert!(sample_terms().validate().is_ok());

        let too_long_term = MortgageTerms { term_months: 301, ..sample_terms() };
        assert!(matches!(
            too_long_term.validate(),
            Err(EngineError::InvalidInput { field: "term_months", .. })
        ));

        let negative_rate = MortgageTerms { annual_interest_rate: -0.01, ..sample_terms() };
        assert!(negative_rate.validate().is_err());

        let amortization = MortgageTerms { amortization_months: 601, ..sample_terms() };
        assert!(amortization.validate().is_err());
    }

    #[test]
    fn test_renewal_terms() {
        let terms = sample_terms();
        let renewal_date = NaiveDate::from_ymd_opt(2029, 1, 31).unwrap();
        let renewed = terms.renewed(250_000.0, 0.06, renewal_date).unwrap();
        assert_eq!(renewed.amortization_months, 240);
        assert_eq!(renewed.term_months, 60);
        assert_eq!(renewed.original_amount, 250_000.0);
        assert_eq!(renewed.start_date, renewal_date);

        let full = MortgageTerms { term_months: 300, ..terms };
        assert!(full.renewed(1_000.0, 0.05, renewal_date).is_none());
    }
}
