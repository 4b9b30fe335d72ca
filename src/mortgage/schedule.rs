//! Payment-by-payment amortization schedules

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::payment::payment_for_terms;
use super::rates::periodic_rate;
use super::terms::{MortgageTerms, PaymentFrequency};
use crate::error::Result;

/// Balances below half a cent are treated as fully repaid
const BALANCE_SNAP: f64 = 0.005;

/// One scheduled payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// 1-based, increasing by one per record
    pub payment_number: u32,
    pub date: NaiveDate,
    pub principal_portion: f64,
    pub interest_portion: f64,
    /// Principal plus interest for the period
    pub total_payment: f64,
    /// Prepaid principal applied together with this payment
    #[serde(default)]
    pub extra_principal: f64,
    pub remaining_balance: f64,
}

/// Principal and interest falling in one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyDebtService {
    pub year: i32,
    pub payments: u32,
    pub principal: f64,
    pub interest: f64,
    pub extra_principal: f64,
    /// Balance after the last payment of the year
    pub ending_balance: f64,
}

impl YearlyDebtService {
    fn empty(year: i32, balance: f64) -> Self {
        Self {
            year,
            payments: 0,
            principal: 0.0,
            interest: 0.0,
            extra_principal: 0.0,
            ending_balance: balance,
        }
    }

    /// Scheduled principal and interest due in the year
    pub fn total(&self) -> f64 {
        self.principal + self.interest
    }
}

/// Ordered sequence of payment records for one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub frequency: PaymentFrequency,

    /// Principal outstanding before the first record
    pub opening_balance: f64,

    /// Scheduled payment of the first term
    pub payment: f64,

    /// Per-period rate of the first term
    pub periodic_rate: f64,

    pub records: Vec<PaymentRecord>,
}

impl AmortizationSchedule {
    fn empty(frequency: PaymentFrequency, opening_balance: f64) -> Self {
        Self {
            frequency,
            opening_balance,
            payment: 0.0,
            periodic_rate: 0.0,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for a 1-based payment number
    pub fn get(&self, payment_number: u32) -> Option<&PaymentRecord> {
        if payment_number == 0 {
            return None;
        }
        self.records.get(payment_number as usize - 1)
    }

    pub fn total_interest(&self) -> f64 {
        self.records.iter().map(|r| r.interest_portion).sum()
    }

    /// Scheduled plus prepaid principal
    pub fn total_principal(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.principal_portion + r.extra_principal)
            .sum()
    }

    /// Everything paid to the lender, prepayments included
    pub fn total_paid(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.total_payment + r.extra_principal)
            .sum()
    }

    /// Interest on payments numbered after `payment_number`
    pub fn interest_after(&self, payment_number: u32) -> f64 {
        self.records
            .iter()
            .filter(|r| r.payment_number > payment_number)
            .map(|r| r.interest_portion)
            .sum()
    }

    pub fn final_balance(&self) -> f64 {
        self.records
            .last()
            .map(|r| r.remaining_balance)
            .unwrap_or(self.opening_balance)
    }

    pub fn is_paid_off(&self) -> bool {
        self.final_balance() <= 0.0
    }

    /// Date of the payment that retires the loan, if it falls in the schedule
    pub fn payoff_date(&self) -> Option<NaiveDate> {
        self.records
            .last()
            .filter(|r| r.remaining_balance <= 0.0)
            .map(|r| r.date)
    }

    /// Balance after the given payment (the opening balance for payment 0)
    pub fn balance_after(&self, payment_number: u32) -> f64 {
        if payment_number == 0 {
            return self.opening_balance;
        }
        self.get(payment_number)
            .or_else(|| self.records.last())
            .map(|r| r.remaining_balance)
            .unwrap_or(self.opening_balance)
    }

    /// Balance after the last payment dated on or before 31 December of `year`
    pub fn balance_at_end_of_year(&self, year: i32) -> f64 {
        self.records
            .iter()
            .take_while(|r| r.date.year() <= year)
            .last()
            .map(|r| r.remaining_balance)
            .unwrap_or(self.opening_balance)
    }

    /// Aggregate records by calendar year, in date order
    pub fn yearly_totals(&self) -> Vec<YearlyDebtService> {
        self.records.iter().fold(Vec::new(), |mut years, record| {
            let year = record.date.year();
            if years.last().map(|y: &YearlyDebtService| y.year) != Some(year) {
                years.push(YearlyDebtService::empty(year, record.remaining_balance));
            }
            if let Some(current) = years.last_mut() {
                current.payments += 1;
                current.principal += record.principal_portion;
                current.interest += record.interest_portion;
                current.extra_principal += record.extra_principal;
                current.ending_balance = record.remaining_balance;
            }
            years
        })
    }

    /// Debt service for one calendar year; zero once the loan is repaid
    pub fn debt_service_for_year(&self, year: i32) -> YearlyDebtService {
        let balance = self.balance_at_end_of_year(year);
        self.records
            .iter()
            .filter(|r| r.date.year() == year)
            .fold(YearlyDebtService::empty(year, balance), |mut acc, r| {
                acc.payments += 1;
                acc.principal += r.principal_portion;
                acc.interest += r.interest_portion;
                acc.extra_principal += r.extra_principal;
                acc
            })
    }
}

/// Period-by-period amortization walk shared by schedule generation and the
/// prepayment analysis
#[derive(Debug, Clone)]
pub(crate) struct Amortizer {
    pub frequency: PaymentFrequency,
    /// Anchor for payment dates; payment n falls n periods after it
    pub start_date: NaiveDate,
    pub periodic_rate: f64,
    pub payment: f64,
    /// Payment number that completes the amortization and absorbs any residual
    pub final_payment: u32,
    /// Last payment number the walk may produce
    pub last_payment: u32,
}

impl Amortizer {
    pub fn from_terms(terms: &MortgageTerms) -> Result<Self> {
        Ok(Self {
            frequency: terms.payment_frequency,
            start_date: terms.start_date,
            periodic_rate: periodic_rate(terms.annual_interest_rate, terms.rate_type, terms.payment_frequency),
            payment: payment_for_terms(terms)?,
            final_payment: terms.amortization_payments(),
            last_payment: terms.scheduled_payments(),
        })
    }

    /// Walk from `opening_balance` starting at payment `first_payment`
    ///
    /// `extra` supplies prepaid principal for a payment number. The walk stops
    /// at `last_payment` or as soon as the balance reaches zero.
    pub fn walk<F>(&self, opening_balance: f64, first_payment: u32, extra: F) -> Vec<PaymentRecord>
    where
        F: Fn(u32) -> f64,
    {
        let mut records = Vec::new();
        let mut balance = opening_balance;

        for payment_number in first_payment..=self.last_payment {
            if balance <= 0.0 {
                break;
            }

            let interest = balance * self.periodic_rate;
            let principal = if payment_number >= self.final_payment {
                balance
            } else {
                (self.payment - interest).min(balance).max(0.0)
            };
            let extra_principal = extra(payment_number).max(0.0).min(balance - principal);

            balance -= principal + extra_principal;
            if balance < BALANCE_SNAP {
                balance = 0.0;
            }

            records.push(PaymentRecord {
                payment_number,
                date: self.frequency.payment_date(self.start_date, payment_number),
                principal_portion: principal,
                interest_portion: interest,
                total_payment: principal + interest,
                extra_principal,
                remaining_balance: balance,
            });
        }

        records
    }

    pub fn into_schedule(self, opening_balance: f64, records: Vec<PaymentRecord>) -> AmortizationSchedule {
        AmortizationSchedule {
            frequency: self.frequency,
            opening_balance,
            payment: self.payment,
            periodic_rate: self.periodic_rate,
            records,
        }
    }
}

/// Generate the schedule for a set of terms
///
/// The schedule covers the shorter of the term and the amortization. A loan
/// with no principal left yields an empty schedule.
pub fn generate(terms: &MortgageTerms) -> Result<AmortizationSchedule> {
    terms.validate()?;
    if terms.original_amount <= 0.0 {
        return Ok(AmortizationSchedule::empty(terms.payment_frequency, 0.0));
    }

    let amortizer = Amortizer::from_terms(terms)?;
    let records = amortizer.walk(terms.original_amount, 1, |_| 0.0);
    let schedule = amortizer.into_schedule(terms.original_amount, records);

    log::debug!(
        "generated {} {} payments of {:.2} on {:.2}, final balance {:.2}",
        schedule.len(),
        terms.payment_frequency,
        schedule.payment,
        terms.original_amount,
        schedule.final_balance()
    );

    Ok(schedule)
}

/// Amortize across successive renewals until the loan is repaid or the
/// schedule reaches `through_year`
///
/// Each renewal refinances the outstanding balance over the remaining
/// amortization at `renewal_rate` (decimal), or at the expiring term's rate
/// when no renewal rate is given. Payment numbers continue across renewals.
pub fn amortize_through(
    terms: &MortgageTerms,
    through_year: i32,
    renewal_rate: Option<f64>,
) -> Result<AmortizationSchedule> {
    let mut schedule = generate(terms)?;
    let mut current = terms.clone();

    loop {
        let (balance, date, number) = match schedule.records.last() {
            Some(last) => (last.remaining_balance, last.date, last.payment_number),
            None => break,
        };
        if balance <= 0.0 || date.year() >= through_year {
            break;
        }

        let rate = renewal_rate.unwrap_or(current.annual_interest_rate);
        let next = match current.renewed(balance, rate, date) {
            Some(next) => next,
            None => break,
        };

        let segment = generate(&next)?;
        if segment.is_empty() {
            break;
        }
        log::debug!(
            "renewed {:.2} at {:.4} on {} for {} months",
            balance,
            rate,
            date,
            next.term_months
        );
        schedule.records.extend(segment.records.into_iter().map(|mut record| {
            record.payment_number += number;
            record
        }));
        current = next;
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortgage::terms::RateType;
    use approx::assert_abs_diff_eq;

    fn terms(frequency: PaymentFrequency) -> MortgageTerms {
        MortgageTerms::new(
            300_000.0,
            0.05,
            RateType::Fixed,
            300,
            300,
            frequency,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    fn five_year_term() -> MortgageTerms {
        MortgageTerms::new(
            440_000.0,
            0.025,
            RateType::Fixed,
            360,
            60,
            PaymentFrequency::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_five_year_term_binds_before_amortization() {
        let terms = five_year_term();
        let schedule = generate(&terms).unwrap();

        assert_eq!(schedule.len(), 60);
        assert_eq!(schedule.payment, 1735.58);

        let first = &schedule.records[0];
        let rate = periodic_rate(0.025, RateType::Fixed, PaymentFrequency::Monthly);
        assert_abs_diff_eq!(first.interest_portion, 440_000.0 * rate, epsilon = 1e-9);
        assert_abs_diff_eq!(first.total_payment, 1735.58, epsilon = 1e-9);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        // Renewal case: still owing at term end
        assert!(schedule.final_balance() > 0.0);
        assert!(schedule.payoff_date().is_none());
    }

    #[test]
    fn test_balances_non_increasing_and_conserved() {
        for frequency in PaymentFrequency::ALL {
            let schedule = generate(&terms(frequency)).unwrap();
            let mut previous = schedule.opening_balance;
            for (i, record) in schedule.records.iter().enumerate() {
                assert_eq!(record.payment_number, i as u32 + 1);
                assert!(record.remaining_balance <= previous, "{} payment {}", frequency, i + 1);
                assert!(record.remaining_balance >= 0.0);
                assert_abs_diff_eq!(
                    record.principal_portion + record.interest_portion,
                    record.total_payment,
                    epsilon = 0.01
                );
                previous = record.remaining_balance;
            }
            assert!(schedule.final_balance().abs() < 0.01, "{} not repaid", frequency);
        }
    }

    #[test]
    fn test_accelerated_frequencies_repay_sooner() {
        let payoff = |frequency| generate(&terms(frequency)).unwrap().payoff_date().unwrap();

        let monthly = payoff(PaymentFrequency::Monthly);
        let bi_weekly = payoff(PaymentFrequency::BiWeekly);
        let accelerated = payoff(PaymentFrequency::AcceleratedBiWeekly);

        assert!(accelerated < bi_weekly);
        assert!(bi_weekly < monthly);
        assert!(payoff(PaymentFrequency::AcceleratedWeekly) < payoff(PaymentFrequency::Weekly));

        assert_eq!(generate(&terms(PaymentFrequency::Monthly)).unwrap().len(), 300);
        assert!(generate(&terms(PaymentFrequency::AcceleratedBiWeekly)).unwrap().len() < 650);
    }

    #[test]
    fn test_zero_principal_gives_empty_schedule() {
        let schedule = generate(&terms(PaymentFrequency::Monthly).with_principal(0.0)).unwrap();
        assert!(schedule.is_empty());
        assert!(schedule.is_paid_off());

        let schedule = generate(&terms(PaymentFrequency::Monthly).with_principal(-50.0)).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let bad = MortgageTerms {
            term_months: 400,
            ..terms(PaymentFrequency::Monthly)
        };
        assert!(generate(&bad).is_err());
    }

    #[test]
    fn test_zero_rate_schedule() {
        let terms = MortgageTerms {
            original_amount: 12_000.0,
            annual_interest_rate: 0.0,
            amortization_months: 12,
            term_months: 12,
            ..terms(PaymentFrequency::Monthly)
        };
        let schedule = generate(&terms).unwrap();
        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule.total_interest(), 0.0);
        assert!(schedule.records.iter().all(|r| r.total_payment == 1000.0));
        assert_eq!(schedule.final_balance(), 0.0);
    }

    #[test]
    fn test_yearly_totals_cover_every_record() {
        let schedule = generate(&terms(PaymentFrequency::BiWeekly)).unwrap();
        let years = schedule.yearly_totals();

        assert_eq!(years.first().unwrap().year, 2024);
        let payments: u32 = years.iter().map(|y| y.payments).sum();
        assert_eq!(payments as usize, schedule.len());

        let interest: f64 = years.iter().map(|y| y.interest).sum();
        assert_abs_diff_eq!(interest, schedule.total_interest(), epsilon = 1e-6);

        let y2030 = schedule.debt_service_for_year(2030);
        let from_fold = years.iter().find(|y| y.year == 2030).unwrap();
        assert_abs_diff_eq!(y2030.total(), from_fold.total(), epsilon = 1e-9);
        assert_eq!(y2030.ending_balance, schedule.balance_at_end_of_year(2030));

        let after = schedule.debt_service_for_year(2060);
        assert_eq!(after.total(), 0.0);
        assert_eq!(after.ending_balance, 0.0);
    }

    #[test]
    fn test_balance_lookups() {
        let schedule = generate(&terms(PaymentFrequency::Monthly)).unwrap();
        assert_eq!(schedule.balance_after(0), 300_000.0);
        assert_eq!(schedule.balance_after(12), schedule.records[11].remaining_balance);
        assert_eq!(schedule.balance_at_end_of_year(2023), 300_000.0);
        assert_eq!(schedule.balance_at_end_of_year(2024), schedule.records[10].remaining_balance);
    }

    #[test]
    fn test_amortize_through_renews_at_new_rate() {
        let terms = five_year_term();
        let chained = amortize_through(&terms, 2035, Some(0.05)).unwrap();
        let first_term = generate(&terms).unwrap();

        assert!(chained.len() > 60);
        assert_eq!(&chained.records[..60], &first_term.records[..]);

        let renewal = &chained.records[60];
        assert_eq!(renewal.payment_number, 61);
        assert!(renewal.total_payment > first_term.payment);
        assert!(chained.records.last().unwrap().date.year() >= 2035);

        // Without a horizon limit the chain runs to full repayment
        let full = amortize_through(&terms, 2100, None).unwrap();
        assert!(full.is_paid_off());
        assert!(full.payoff_date().unwrap().year() <= 2054);
    }
}
