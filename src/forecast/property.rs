//! Property cash-flow inputs

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::mortgage::MortgageTerms;

/// Monthly operating expenses by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingExpenses {
    pub property_tax: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub property_management: f64,
    pub utilities: f64,
    pub condo_fees: f64,
    pub other: f64,
}

impl OperatingExpenses {
    /// Single-line expense budget booked under `other`
    pub fn flat(monthly: f64) -> Self {
        Self {
            other: monthly,
            ..Default::default()
        }
    }

    fn categories(&self) -> [(&'static str, f64); 7] {
        [
            ("property_tax", self.property_tax),
            ("insurance", self.insurance),
            ("maintenance", self.maintenance),
            ("property_management", self.property_management),
            ("utilities", self.utilities),
            ("condo_fees", self.condo_fees),
            ("other", self.other),
        ]
    }

    pub fn monthly_total(&self) -> f64 {
        self.categories().iter().fold(0.0, |total, (_, amount)| total + amount)
    }

    pub fn validate(&self) -> Result<()> {
        match self
            .categories()
            .into_iter()
            .find(|(_, amount)| !amount.is_finite() || *amount < 0.0)
        {
            Some((category, amount)) => Err(EngineError::invalid(
                "operating_expenses",
                format!("{} must be a non-negative amount, got {}", category, amount),
            )),
            None => Ok(()),
        }
    }
}

/// Financial profile of one income property
///
/// Callers normalize whatever record shape they store into this type; every
/// field the engine reads is explicit here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFinancials {
    /// Gross scheduled rent per month, before vacancy
    pub monthly_rent: f64,

    #[serde(default)]
    pub operating_expenses: OperatingExpenses,

    #[serde(default)]
    pub purchase_price: Option<f64>,

    /// Current market value; preferred over the purchase price when present
    #[serde(default)]
    pub current_value: Option<f64>,

    #[serde(default)]
    pub mortgage: Option<MortgageTerms>,
}

impl PropertyFinancials {
    pub fn new(monthly_rent: f64, operating_expenses: OperatingExpenses) -> Self {
        Self {
            monthly_rent,
            operating_expenses,
            purchase_price: None,
            current_value: None,
            mortgage: None,
        }
    }

    pub fn with_purchase_price(mut self, price: f64) -> Self {
        self.purchase_price = Some(price);
        self
    }

    pub fn with_current_value(mut self, value: f64) -> Self {
        self.current_value = Some(value);
        self
    }

    pub fn with_mortgage(mut self, mortgage: MortgageTerms) -> Self {
        self.mortgage = Some(mortgage);
        self
    }

    /// Value the projection starts from: market value, else purchase price
    pub fn starting_value(&self) -> Result<f64> {
        self.current_value
            .filter(|v| *v > 0.0)
            .or(self.purchase_price.filter(|v| *v > 0.0))
            .ok_or(EngineError::MissingPropertyValue)
    }

    pub fn monthly_operating_expenses(&self) -> f64 {
        self.operating_expenses.monthly_total()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.monthly_rent.is_finite() || self.monthly_rent < 0.0 {
            return Err(EngineError::invalid(
                "monthly_rent",
                format!("must be a non-negative amount, got {}", self.monthly_rent),
            ));
        }
        self.operating_expenses.validate()?;
        for (field, value) in [("purchase_price", self.purchase_price), ("current_value", self.current_value)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(EngineError::invalid(field, format!("must be a non-negative amount, got {}", v)));
                }
            }
        }
        if let Some(mortgage) = &self.mortgage {
            mortgage.validate()?;
        }
        Ok(())
    }
}
